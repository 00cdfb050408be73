//! Opening and tuning connections on compressed databases.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use crate::err::{Error, Result};
use crate::vfs;
use crate::vfs::store::{detect, FileState};

use super::config::Config;

/// Emit the pragma script derived from a configuration record.
///
/// Applied once per connection; with `unsafe_load` the script additionally
/// turns journaling and synchronous writes off and defers foreign keys for
/// the connection's lifetime.
pub fn tuning_sql(config: &Config) -> Result<String> {
    config.validate()?;
    let mut pragmas = vec![
        format!("PRAGMA page_size = {};", config.inner_page_kib * 1024),
        format!("PRAGMA cache_size = -{};", config.page_cache_mib * 1024),
        format!("PRAGMA threads = {};", config.resolved_threads()),
    ];
    if config.unsafe_load {
        pragmas.push("PRAGMA journal_mode = OFF;".to_string());
        pragmas.push("PRAGMA synchronous = OFF;".to_string());
        pragmas.push("PRAGMA defer_foreign_keys = ON;".to_string());
    }
    Ok(pragmas.join("\n"))
}

fn apply_tuning(conn: &Connection, config: &Config) -> Result<()> {
    conn.execute_batch(&tuning_sql(config)?)?;
    Ok(())
}

fn register_scalar_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "genomicsqlite_version",
        0,
        rusqlite::functions::FunctionFlags::SQLITE_UTF8
            | rusqlite::functions::FunctionFlags::SQLITE_DETERMINISTIC,
        |_ctx| Ok(crate::version()),
    )?;
    Ok(())
}

/// Open a connection on a compressed database and apply the configured
/// tuning.
///
/// The target must be absent, empty, or already in the compressed layout;
/// anything else is refused rather than opened through the default VFS,
/// which would expose the compression-layer schema and invite corruption.
/// `":memory:"` opens an in-memory database, which involves no VFS and is
/// tuned the same way. Every returned connection has the
/// `genomicsqlite_version()` SQL scalar registered.
///
/// On failure the partially opened connection is closed before returning.
pub fn open<P: AsRef<Path>>(path: P, flags: OpenFlags, config: &Config) -> Result<Connection> {
    let path = path
        .as_ref()
        .to_str()
        .ok_or_else(|| Error::Config("database path is not valid UTF-8".to_string()))?;
    config.validate()?;
    if config.unsafe_load {
        tracing::warn!("unsafe_load: journaling and synchronous writes are off");
    }

    let conn = if path == ":memory:" {
        Connection::open_with_flags(path, flags)?
    } else {
        if detect(path)? == FileState::Foreign {
            return Err(Error::Schema(format!(
                "{:?} is neither empty nor a compressed database",
                path
            )));
        }
        if !vfs::registered(vfs::VFS_NAME) {
            return Err(Error::Config(format!(
                "compressed VFS {:?} is not registered with the host engine",
                vfs::VFS_NAME
            )));
        }
        tracing::debug!("opening {:?} via the {} VFS", path, vfs::VFS_NAME);
        Connection::open_with_flags(
            vfs::uri(path, config),
            flags | OpenFlags::SQLITE_OPEN_URI,
        )?
    };

    apply_tuning(&conn, config)?;
    register_scalar_functions(&conn)?;
    Ok(conn)
}
