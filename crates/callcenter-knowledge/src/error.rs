//! Error types for the knowledge index.

/// Errors that can occur while indexing or searching documents.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    /// A database operation failed.
    #[error("knowledge database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No pooled connection could be obtained.
    #[error("knowledge pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// The blocking worker running the query panicked or was cancelled.
    #[error("knowledge task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A seed file could not be read.
    #[error("failed to read seed file: {0}")]
    SeedRead(#[from] std::io::Error),

    /// A seed file is not a JSON array of documents.
    #[error("failed to parse seed file: {0}")]
    SeedParse(#[from] serde_json::Error),
}
