//! Outer layout of a compressed database: an ordinary SQLite file holding
//! the compressed inner pages.

use rusqlite::{Connection, OpenFlags, OptionalExtension};

use crate::db::config::Config;
use crate::err::{Error, Result};
use crate::vfs::codec::{decompress_page, Compressor};

/// Classification of a file considered for opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Absent or zero-length; a compressed database may be created here.
    Empty,
    /// Already in the compressed outer layout.
    CompressedLayout,
    /// Some other file (including a plain uncompressed database).
    Foreign,
}

/// Classify a file without modifying it.
pub fn detect(path: &str) -> Result<FileState> {
    match std::fs::metadata(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(FileState::Empty),
        Err(e) => return Err(e.into()),
        Ok(meta) if meta.len() == 0 => return Ok(FileState::Empty),
        Ok(_) => {}
    }
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let layout_tables: rusqlite::Result<i64> = conn.query_row(
        "SELECT count(*) FROM sqlite_schema WHERE type = 'table' \
         AND name IN ('_zstd_config', '_zstd_pages')",
        [],
        |row| row.get(0),
    );
    match layout_tables {
        Ok(2) => Ok(FileState::CompressedLayout),
        Ok(_) => Ok(FileState::Foreign),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::NotADatabase =>
        {
            Ok(FileState::Foreign)
        }
        Err(e) => Err(e.into()),
    }
}

/// Pages-in/blocks-out store over the outer database.
///
/// Writes are batched: a batch is compressed on the worker pool, then applied
/// and committed in one outer transaction, so it is durable as a unit. Page
/// sizes on both sides are fixed when the store is created.
pub struct PageStore {
    outer: Connection,
    inner_page_size: usize,
    compressor: Compressor,
}

impl PageStore {
    /// Create the outer layout at `path` (which must be absent or empty) and
    /// fix its page sizes from `config`.
    pub fn create(path: &str, config: &Config) -> Result<Self> {
        config.validate()?;
        if detect(path)? != FileState::Empty {
            return Err(Error::Schema(format!(
                "{:?} already exists; refusing to overwrite with a new compressed layout",
                path
            )));
        }
        let outer = Connection::open(path)?;
        outer.execute_batch(&format!(
            "PRAGMA page_size = {};",
            config.outer_page_kib * 1024
        ))?;
        outer.execute_batch(&format!(
            "BEGIN;
             CREATE TABLE _zstd_config(key TEXT NOT NULL PRIMARY KEY, value NOT NULL);
             CREATE TABLE _zstd_pages(pageno INTEGER NOT NULL PRIMARY KEY, data BLOB NOT NULL);
             INSERT INTO _zstd_config(key, value) VALUES
               ('format', 1),
               ('inner_page_size', {inner}),
               ('outer_page_size', {outer});
             COMMIT;",
            inner = config.inner_page_kib * 1024,
            outer = config.outer_page_kib * 1024,
        ))?;
        tracing::debug!(
            "created compressed layout at {:?} (inner {} KiB, outer {} KiB)",
            path,
            config.inner_page_kib,
            config.outer_page_kib
        );
        Ok(Self {
            outer,
            inner_page_size: config.inner_page_kib as usize * 1024,
            compressor: Compressor::new(config.zstd_level, config.resolved_threads() as usize)?,
        })
    }

    /// Open an existing compressed layout. Page sizes come from the stored
    /// configuration; `config` supplies the compression level and worker
    /// budget for pages written through this handle.
    pub fn open(path: &str, config: &Config) -> Result<Self> {
        config.validate()?;
        if detect(path)? != FileState::CompressedLayout {
            return Err(Error::Schema(format!(
                "{:?} is not in the compressed layout",
                path
            )));
        }
        let outer = Connection::open(path)?;
        let inner_page_size: i64 = outer.query_row(
            "SELECT value FROM _zstd_config WHERE key = 'inner_page_size'",
            [],
            |row| row.get(0),
        )?;
        Ok(Self {
            outer,
            inner_page_size: inner_page_size as usize,
            compressor: Compressor::new(config.zstd_level, config.resolved_threads() as usize)?,
        })
    }

    /// Inner page size fixed at creation, in bytes.
    pub fn inner_page_size(&self) -> usize {
        self.inner_page_size
    }

    /// Number of stored pages.
    pub fn page_count(&self) -> Result<i64> {
        Ok(self
            .outer
            .query_row("SELECT count(*) FROM _zstd_pages", [], |row| row.get(0))?)
    }

    /// Compress and durably store a batch of `(pageno, page)` pairs.
    pub fn write_pages(&mut self, pages: Vec<(i64, Vec<u8>)>) -> Result<()> {
        for (pageno, page) in &pages {
            if *pageno < 1 {
                return Err(Error::Integrity(format!("invalid page number {}", pageno)));
            }
            if page.len() != self.inner_page_size {
                return Err(Error::Integrity(format!(
                    "page {} is {} bytes, expected {}",
                    pageno,
                    page.len(),
                    self.inner_page_size
                )));
            }
        }
        let blocks = self.compressor.compress_batch(pages)?;
        let tx = self.outer.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO _zstd_pages(pageno, data) VALUES (?1, ?2) \
                 ON CONFLICT(pageno) DO UPDATE SET data = excluded.data",
            )?;
            for (pageno, block) in &blocks {
                stmt.execute(rusqlite::params![pageno, block])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Fetch and decompress one page; `None` if it was never written.
    pub fn read_page(&self, pageno: i64) -> Result<Option<Vec<u8>>> {
        let block: Option<Vec<u8>> = self
            .outer
            .query_row(
                "SELECT data FROM _zstd_pages WHERE pageno = ?1",
                rusqlite::params![pageno],
                |row| row.get(0),
            )
            .optional()?;
        block
            .map(|block| decompress_page(&block, self.inner_page_size))
            .transpose()
    }

    /// Drop all pages past the new page count (file truncation).
    pub fn truncate(&mut self, page_count: i64) -> Result<()> {
        self.outer.execute(
            "DELETE FROM _zstd_pages WHERE pageno > ?1",
            rusqlite::params![page_count],
        )?;
        Ok(())
    }
}

impl std::fmt::Debug for PageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageStore")
            .field("inner_page_size", &self.inner_page_size)
            .field("compressor", &self.compressor)
            .finish()
    }
}
