//! Async store traits and the pooled SQLite implementation.

use async_trait::async_trait;
use callcenter_db::DbPool;
use callcenter_types::{AccountStatus, TicketPriority, Turn};
use rusqlite::Connection;

use crate::conversations;
use crate::customers::{self, Customer};
use crate::error::RecordError;
use crate::tickets::{self, Ticket};

/// Account and ticket operations used by the agent's tools.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn customer(&self, phone: &str) -> Result<Option<Customer>, RecordError>;

    async fn set_customer_status(
        &self,
        phone: &str,
        status: AccountStatus,
    ) -> Result<Option<Customer>, RecordError>;

    async fn open_ticket(
        &self,
        phone: &str,
        issue: &str,
        priority: TicketPriority,
    ) -> Result<i64, RecordError>;

    async fn tickets(&self, phone: &str) -> Result<Vec<Ticket>, RecordError>;
}

/// Conversation history operations used by the memory adapter.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Stores a caller turn and the agent's reply together or not at all.
    async fn append_exchange(
        &self,
        phone: &str,
        caller: &Turn,
        agent: &Turn,
    ) -> Result<(), RecordError>;

    /// Most recent `limit` turns, oldest first.
    async fn recent_turns(&self, phone: &str, limit: usize) -> Result<Vec<Turn>, RecordError>;
}

/// Record store backed by the shared SQLite pool.
///
/// Each operation checks out a connection and runs on the blocking thread
/// pool so that SQLite I/O never stalls the async runtime.
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: DbPool,
}

impl SqliteRecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, RecordError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, RecordError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn)
        })
        .await?
    }
}

#[async_trait]
impl AccountStore for SqliteRecordStore {
    async fn customer(&self, phone: &str) -> Result<Option<Customer>, RecordError> {
        let phone = phone.to_string();
        self.with_conn(move |conn| customers::get_customer(conn, &phone))
            .await
    }

    async fn set_customer_status(
        &self,
        phone: &str,
        status: AccountStatus,
    ) -> Result<Option<Customer>, RecordError> {
        let phone = phone.to_string();
        let updated = self
            .with_conn(move |conn| customers::update_customer_status(conn, &phone, status))
            .await?;
        if let Some(customer) = &updated {
            tracing::info!(
                customer_id = customer.id,
                status = status.as_str(),
                "customer status updated"
            );
        }
        Ok(updated)
    }

    async fn open_ticket(
        &self,
        phone: &str,
        issue: &str,
        priority: TicketPriority,
    ) -> Result<i64, RecordError> {
        let phone = phone.to_string();
        let issue = issue.to_string();
        let id = self
            .with_conn(move |conn| tickets::create_ticket(conn, &phone, &issue, priority))
            .await?;
        tracing::info!(ticket_id = id, priority = priority.as_str(), "support ticket created");
        Ok(id)
    }

    async fn tickets(&self, phone: &str) -> Result<Vec<Ticket>, RecordError> {
        let phone = phone.to_string();
        self.with_conn(move |conn| tickets::list_tickets(conn, &phone))
            .await
    }
}

#[async_trait]
impl ConversationStore for SqliteRecordStore {
    async fn append_exchange(
        &self,
        phone: &str,
        caller: &Turn,
        agent: &Turn,
    ) -> Result<(), RecordError> {
        let phone = phone.to_string();
        let caller = caller.clone();
        let agent = agent.clone();
        self.with_conn(move |conn| conversations::append_exchange(conn, &phone, &caller, &agent))
            .await
    }

    async fn recent_turns(&self, phone: &str, limit: usize) -> Result<Vec<Turn>, RecordError> {
        let phone = phone.to_string();
        self.with_conn(move |conn| conversations::recent_turns(conn, &phone, limit))
            .await
    }
}
