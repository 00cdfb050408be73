//! Emitter for copying a database into a freshly compressed file.

use crate::common::quote_text;
use crate::err::{Error, Result};
use crate::vfs;

use super::config::Config;

/// Emit SQL that copies the connected database into a new compressed file at
/// `dest` using the host engine's `VACUUM INTO`.
///
/// Works on any connection with the extension loaded and URI filenames
/// enabled, including one opened on a plain uncompressed database; the
/// destination's page sizes and compression configuration come from
/// `config`. The pragmas precede the `VACUUM INTO` because the destination
/// inherits the source connection's page size.
pub fn vacuum_into_sql(dest: &str, config: &Config) -> Result<String> {
    config.validate()?;
    if dest.is_empty() {
        return Err(Error::Config("empty destination path".to_string()));
    }
    let sql = format!(
        "PRAGMA page_size = {page_size};\n\
         PRAGMA auto_vacuum = NONE;\n\
         VACUUM INTO {dest};",
        page_size = config.inner_page_kib * 1024,
        dest = quote_text(&vfs::uri(dest, config)),
    );
    tracing::debug!("vacuum into {:?}", dest);
    Ok(sql)
}
