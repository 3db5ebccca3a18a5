//! SQLite FTS5 index and the async search trait.

use async_trait::async_trait;
use callcenter_db::DbPool;
use rusqlite::{params, Connection};
use std::path::Path;

use crate::document::KnowledgeDocument;
use crate::error::KnowledgeError;

/// Free-text search over FAQ and policy passages.
#[async_trait]
pub trait KnowledgeSearch: Send + Sync {
    /// Returns up to `limit` passages, best match first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, KnowledgeError>;
}

/// Indexes documents, replacing any existing document with the same id.
///
/// Returns the number of documents written.
pub fn add_documents(
    conn: &Connection,
    docs: &[KnowledgeDocument],
) -> Result<usize, KnowledgeError> {
    let tx = conn.unchecked_transaction()?;
    for doc in docs {
        tx.execute(
            "INSERT INTO knowledge_documents (doc_id, category, body) VALUES (?1, ?2, ?3)
             ON CONFLICT (doc_id) DO UPDATE SET category = excluded.category, body = excluded.body",
            params![doc.id, doc.category, doc.text],
        )?;
        tx.execute("DELETE FROM knowledge_fts WHERE doc_id = ?1", [&doc.id])?;
        tx.execute(
            "INSERT INTO knowledge_fts (doc_id, body) VALUES (?1, ?2)",
            params![doc.id, doc.text],
        )?;
    }
    tx.commit()?;
    Ok(docs.len())
}

/// Number of indexed documents.
pub fn document_count(conn: &Connection) -> Result<usize, KnowledgeError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM knowledge_documents", [], |row| {
        row.get(0)
    })?;
    Ok(usize::try_from(count).unwrap_or_default())
}

/// Builds an FTS5 MATCH expression from free text.
///
/// Each alphanumeric term of two or more characters becomes a quoted phrase
/// and the terms are OR-ed, so punctuation in a caller's question can never
/// be parsed as FTS5 syntax. Returns `None` when nothing searchable remains.
fn match_expression(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|term| term.chars().count() > 1)
        .map(|term| format!("\"{}\"", term.to_lowercase()))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

/// Searches the index and returns up to `limit` passages ranked by `bm25`.
pub fn search(conn: &Connection, query: &str, limit: usize) -> Result<Vec<String>, KnowledgeError> {
    let Some(expression) = match_expression(query) else {
        return Ok(Vec::new());
    };

    let mut stmt = conn.prepare(
        "SELECT d.body
         FROM knowledge_fts
         JOIN knowledge_documents d ON d.doc_id = knowledge_fts.doc_id
         WHERE knowledge_fts MATCH ?1
         ORDER BY bm25(knowledge_fts)
         LIMIT ?2",
    )?;

    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt.query_map(params![expression, limit], |row| row.get(0))?;

    let mut passages = Vec::new();
    for row in rows {
        passages.push(row?);
    }
    Ok(passages)
}

/// Knowledge index stored in the shared SQLite database.
#[derive(Clone)]
pub struct SqliteKnowledgeIndex {
    pool: DbPool,
}

impl SqliteKnowledgeIndex {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, KnowledgeError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, KnowledgeError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn)
        })
        .await?
    }

    pub async fn add_documents(
        &self,
        docs: Vec<KnowledgeDocument>,
    ) -> Result<usize, KnowledgeError> {
        let added = self.with_conn(move |conn| add_documents(conn, &docs)).await?;
        tracing::info!(count = added, "added documents to knowledge base");
        Ok(added)
    }

    pub async fn document_count(&self) -> Result<usize, KnowledgeError> {
        self.with_conn(document_count).await
    }

    /// Indexes `docs` only when the index holds no documents yet.
    ///
    /// Returns the number of documents added (zero if already seeded).
    pub async fn seed_if_empty(
        &self,
        docs: Vec<KnowledgeDocument>,
    ) -> Result<usize, KnowledgeError> {
        if self.document_count().await? > 0 {
            tracing::debug!("knowledge base already seeded, skipping");
            return Ok(0);
        }
        self.add_documents(docs).await
    }

    /// Reads a JSON array of [`KnowledgeDocument`] from disk.
    pub async fn load_seed_file(
        path: impl AsRef<Path>,
    ) -> Result<Vec<KnowledgeDocument>, KnowledgeError> {
        let contents = tokio::fs::read_to_string(path.as_ref()).await?;
        let docs = serde_json::from_str(&contents)?;
        Ok(docs)
    }
}

#[async_trait]
impl KnowledgeSearch for SqliteKnowledgeIndex {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, KnowledgeError> {
        let query = query.to_string();
        self.with_conn(move |conn| search(conn, &query, limit)).await
    }
}
