#![allow(dead_code)]

use async_trait::async_trait;
use callcenter_agent::{ChatMessage, ChatModel, ModelError, ModelReply, ModelRequest};
use callcenter_knowledge::{KnowledgeError, KnowledgeSearch};
use callcenter_records::{AccountStore, Customer, RecordError, Ticket};
use callcenter_types::{AccountStatus, TicketPriority, ToolCall};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

pub const CALLER: &str = "+1234567890";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Replays a fixed sequence of replies and records every transcript it saw.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<ModelReply, ModelError>>>,
    pub requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<ModelReply, ModelError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::default(),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelReply, ModelError> {
        self.requests.lock().unwrap().push(request.messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Malformed("script exhausted".to_string())))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Asks for the same tool forever.
pub struct LoopingModel;

#[async_trait]
impl ChatModel for LoopingModel {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelReply, ModelError> {
        let n = request.messages.len();
        Ok(ModelReply::ToolRequests {
            text: None,
            calls: vec![ToolCall::new(
                format!("call_{n}"),
                "get_customer_tickets",
                "{}",
            )],
        })
    }

    fn name(&self) -> &str {
        "looping"
    }
}

/// Never answers within any reasonable timeout.
pub struct StalledModel;

#[async_trait]
impl ChatModel for StalledModel {
    async fn complete(&self, _request: ModelRequest<'_>) -> Result<ModelReply, ModelError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(ModelReply::Final(Some("too late".to_string())))
    }

    fn name(&self) -> &str {
        "stalled"
    }
}

pub fn final_reply(text: &str) -> Result<ModelReply, ModelError> {
    Ok(ModelReply::Final(Some(text.to_string())))
}

pub fn tool_request(id: &str, name: &str, arguments: &str) -> Result<ModelReply, ModelError> {
    Ok(ModelReply::ToolRequests {
        text: None,
        calls: vec![ToolCall::new(id, name, arguments)],
    })
}

pub fn customer(phone: &str, name: &str, status: AccountStatus) -> Customer {
    Customer {
        id: 1,
        phone: phone.to_string(),
        name: name.to_string(),
        email: Some("alice@example.com".to_string()),
        plan: "premium".to_string(),
        status,
        balance: 250.0,
        created_at: "2026-01-01 00:00:00".to_string(),
    }
}

/// In-memory accounts and tickets.
#[derive(Default)]
pub struct MemoryAccounts {
    pub customers: Mutex<HashMap<String, Customer>>,
    pub tickets: Mutex<Vec<Ticket>>,
    pub delay: Option<Duration>,
    pub broken: bool,
}

impl MemoryAccounts {
    pub fn with_customer(customer: Customer) -> Self {
        let accounts = Self::default();
        accounts
            .customers
            .lock()
            .unwrap()
            .insert(customer.phone.clone(), customer);
        accounts
    }

    async fn gate(&self) -> Result<(), RecordError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.broken {
            return Err(RecordError::Database(rusqlite::Error::InvalidQuery));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryAccounts {
    async fn customer(&self, phone: &str) -> Result<Option<Customer>, RecordError> {
        self.gate().await?;
        Ok(self.customers.lock().unwrap().get(phone).cloned())
    }

    async fn set_customer_status(
        &self,
        phone: &str,
        status: AccountStatus,
    ) -> Result<Option<Customer>, RecordError> {
        self.gate().await?;
        let mut customers = self.customers.lock().unwrap();
        Ok(customers.get_mut(phone).map(|c| {
            c.status = status;
            c.clone()
        }))
    }

    async fn open_ticket(
        &self,
        phone: &str,
        issue: &str,
        priority: TicketPriority,
    ) -> Result<i64, RecordError> {
        self.gate().await?;
        let mut tickets = self.tickets.lock().unwrap();
        let id = tickets.len() as i64 + 1;
        tickets.push(Ticket {
            id,
            phone: phone.to_string(),
            issue: issue.to_string(),
            priority,
            status: "open".to_string(),
            created_at: "2026-01-01 00:00:00".to_string(),
        });
        Ok(id)
    }

    async fn tickets(&self, phone: &str) -> Result<Vec<Ticket>, RecordError> {
        self.gate().await?;
        let mut found: Vec<Ticket> = self
            .tickets
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.phone == phone)
            .cloned()
            .collect();
        found.reverse();
        Ok(found)
    }
}

/// Returns canned passages and remembers the queries it was asked.
#[derive(Default)]
pub struct CannedKnowledge {
    pub passages: Vec<String>,
    pub queries: Mutex<Vec<(String, usize)>>,
}

impl CannedKnowledge {
    pub fn new(passages: &[&str]) -> Self {
        Self {
            passages: passages.iter().map(|p| p.to_string()).collect(),
            queries: Mutex::default(),
        }
    }
}

#[async_trait]
impl KnowledgeSearch for CannedKnowledge {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, KnowledgeError> {
        self.queries.lock().unwrap().push((query.to_string(), limit));
        Ok(self.passages.iter().take(limit).cloned().collect())
    }
}
