//! Genomics extension core for SQLite.
//!
//! Equips the host engine for large genomics datasets with two subsystems:
//! the genomic range index ([`gri`]), a secondary-index design answering
//! interval-overlap queries through emitted SQL, and the compressed storage
//! layer ([`vfs`]) holding the database file zstd-compressed page by page.
//! Around them sit the reference-sequence catalog ([`refseq`]) and the
//! connection opener, tuner, and `VACUUM INTO` emitter ([`db`]).
//!
//! The core is a SQL generator, not an executor: operations return SQL
//! strings for the caller to compose into arbitrary outer queries (joins,
//! `WITH`, views) and to prepare once and re-bind many times. The host
//! engine's own planner and storage do the heavy lifting. JSON convenience
//! functions are delegated to the engine's bundled JSON module; no separate
//! surface is registered for them.

pub mod common;
pub mod db;
pub mod err;
pub mod gri;
pub mod refseq;
pub mod vfs;

pub use db::config::Config;
pub use db::open::open;
pub use db::vacuum::vacuum_into_sql;
pub use err::{Error, Result};
pub use gri::{
    create_genomic_range_index_sql, genomic_range_rowids_sql, GriQuery, GriQueryOptions,
};
pub use refseq::RefSeq;

/// Extension version, also exposed to SQL as `genomicsqlite_version()` on
/// every connection produced by [`open`].
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
