//! FAQ and policy knowledge search for the call center agent.
//!
//! Documents are stored in SQLite and indexed with FTS5. Queries are reduced
//! to plain search terms and ranked with `bm25`, so callers' free-form
//! questions ("how do I reset my password?") match passages without exact
//! wording. The agent only sees the [`KnowledgeSearch`] trait; the index is
//! constructed once and injected.

mod document;
mod error;
mod index;

pub use document::{default_faqs, KnowledgeDocument};
pub use error::KnowledgeError;
pub use index::{add_documents, document_count, search, KnowledgeSearch, SqliteKnowledgeIndex};
