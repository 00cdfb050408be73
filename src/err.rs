//! Error type shared across the extension's emitters, opener, and storage layer.

/// Errors reported by the genomics extension.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Unknown configuration key or out-of-domain value.
    #[error("configuration: {0}")]
    Config(String),
    /// Indexing applied to an unsupported table, or reuse of a reserved name.
    #[error("schema: {0}")]
    Schema(String),
    /// Stored data inconsistent with caller-supplied bounds.
    #[error("integrity: {0}")]
    Integrity(String),
    /// The query planner's index probe failed; callers may retry with an
    /// explicit ceiling to bypass probing.
    #[error("probe: {0}")]
    Probe(String),
    /// Error surfaced by the host engine, with its native code and message.
    #[error("engine: {0}")]
    Engine(#[from] rusqlite::Error),
    /// I/O error inspecting or staging database files.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type with [`enum@Error`] as the error variant.
pub type Result<T> = std::result::Result<T, Error>;
