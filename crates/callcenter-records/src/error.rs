//! Error types for record persistence.

/// Errors that can occur while reading or writing records.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// A database operation failed.
    #[error("records database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No pooled connection could be obtained.
    #[error("records pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// The blocking worker running the query panicked or was cancelled.
    #[error("records task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
