//! Compressed storage layer: the `zstd` VFS contract and its native pieces.
//!
//! The host engine sees the compressed database through a VFS registered
//! under [`VFS_NAME`]; applications never address the layer in SQL. The
//! contract is pages in, blocks out: the engine hands the VFS fixed-size
//! inner pages, the VFS stores them zstd-compressed inside an outer database
//! file ([`store`]), compressing dirty batches on a bounded worker pool
//! ([`codec::Compressor`], sized by the `threads` budget) and committing them
//! in outer transactions so a sync on the inner database is durable once the
//! outer commit returns. Page sizes on both sides are fixed when the file is
//! created; the compression level applies to newly written pages only.
//!
//! Registration of the VFS with the host engine happens when the loadable
//! extension is present in the process; [`registered`] checks for it and the
//! connection opener refuses the compressed path when it is absent.

pub mod codec;
pub mod store;

use crate::db::config::Config;

/// Name the compressed VFS is registered under.
pub const VFS_NAME: &str = "zstd";

/// Whether a VFS with the given name is registered with the host engine.
pub fn registered(name: &str) -> bool {
    let Ok(cname) = std::ffi::CString::new(name) else {
        return false;
    };
    let found = unsafe { rusqlite::ffi::sqlite3_vfs_find(cname.as_ptr()) };
    !found.is_null()
}

/// Build the URI opening `path` through the compressed VFS with the given
/// configuration applied to the storage layer.
pub fn uri(path: &str, config: &Config) -> String {
    let mut uri = format!(
        "file:{}?vfs={}&outer_page_size={}&level={}&threads={}",
        encode_uri_path(path),
        VFS_NAME,
        config.outer_page_kib * 1024,
        config.zstd_level,
        config.resolved_threads(),
    );
    if config.unsafe_load {
        uri.push_str("&outer_unsafe=true");
    }
    uri
}

/// Percent-encode the characters that would terminate or garble the URI
/// filename portion.
fn encode_uri_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        match c {
            '%' => out.push_str("%25"),
            '?' => out.push_str("%3F"),
            '#' => out.push_str("%23"),
            _ => out.push(c),
        }
    }
    out
}
