//! Tool catalog and dispatch.
//!
//! Every tool result is plain text for the model. Failures never escape
//! [`ToolRegistry::execute`]: they come back as text starting with
//! [`TOOL_ERROR_MARKER`] so the model can apologize or try something else.

use callcenter_knowledge::{KnowledgeError, KnowledgeSearch};
use callcenter_records::{AccountStore, RecordError};
use callcenter_types::{AccountStatus, TicketPriority, ToolCall};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::model::ToolSpec;

/// Prefix of every tool result that reports a failure.
pub const TOOL_ERROR_MARKER: &str = "[tool error]";

const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_SEARCH_LIMIT: usize = 3;
const PASSAGE_SEPARATOR: &str = "\n---\n";

/// Who the tools act for during one agent run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolContext {
    /// Phone number of the current caller. Used when a tool call omits `phone`.
    pub caller: String,
}

impl ToolContext {
    pub fn new(caller: impl Into<String>) -> Self {
        Self {
            caller: caller.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum ToolError {
    #[error("Unknown tool '{0}'. No action taken.")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: &'static str, reason: String },

    #[error("{tool} could not reach the account system: {source}")]
    Records {
        tool: &'static str,
        source: RecordError,
    },

    #[error("{tool} could not reach the knowledge base: {source}")]
    Knowledge {
        tool: &'static str,
        source: KnowledgeError,
    },

    #[error("{tool} could not encode its result: {source}")]
    Encode {
        tool: &'static str,
        source: serde_json::Error,
    },

    #[error("{tool} timed out after {limit:?}")]
    Timeout { tool: &'static str, limit: Duration },
}

#[derive(Debug, Deserialize)]
struct PhoneArgs {
    #[serde(default)]
    phone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

#[derive(Debug, Deserialize)]
struct TicketArgs {
    #[serde(default)]
    phone: Option<String>,
    issue: String,
    #[serde(default)]
    priority: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusArgs {
    #[serde(default)]
    phone: Option<String>,
    status: String,
}

fn parse_args<T: DeserializeOwned>(tool: &'static str, raw: &str) -> Result<T, ToolError> {
    let raw = match raw.trim() {
        "" | "null" => "{}",
        _ => raw,
    };
    serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments {
        tool,
        reason: e.to_string(),
    })
}

fn resolve_phone(ctx: &ToolContext, phone: Option<String>) -> String {
    match phone {
        Some(p) if !p.trim().is_empty() => p.trim().to_string(),
        _ => ctx.caller.clone(),
    }
}

fn parse_label<T>(tool: &'static str, field: &str, value: &str) -> Result<T, ToolError>
where
    T: std::str::FromStr<Err = callcenter_types::ParseLabelError>,
{
    value
        .trim()
        .to_lowercase()
        .parse()
        .map_err(|_| ToolError::InvalidArguments {
            tool,
            reason: format!("unsupported {field} '{value}'"),
        })
}

fn to_json_text<T: serde::Serialize>(tool: &'static str, value: &T) -> Result<String, ToolError> {
    serde_json::to_string(value).map_err(|source| ToolError::Encode { tool, source })
}

/// Declares the agent's tools and runs them against the injected stores.
#[derive(Clone)]
pub struct ToolRegistry {
    accounts: Arc<dyn AccountStore>,
    knowledge: Arc<dyn KnowledgeSearch>,
    timeout: Duration,
    search_limit: usize,
}

impl ToolRegistry {
    pub fn new(accounts: Arc<dyn AccountStore>, knowledge: Arc<dyn KnowledgeSearch>) -> Self {
        Self {
            accounts,
            knowledge,
            timeout: DEFAULT_TOOL_TIMEOUT,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Bound on each lookup. Writes are not raced against it: a ticket or
    /// status change runs until the store commits or fails, so the reported
    /// result always matches what was stored.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Maximum passages returned by `search_knowledge_base`.
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit.max(1);
        self
    }

    /// JSON-schema declarations for every tool, in a stable order.
    pub fn catalog(&self) -> Vec<ToolSpec> {
        let phone = json!({
            "type": "string",
            "description": "Customer phone number. Defaults to the current caller."
        });
        vec![
            ToolSpec {
                name: "get_customer_info",
                description: "Look up a customer's account: name, plan, status and balance.",
                parameters: json!({
                    "type": "object",
                    "properties": {"phone": phone.clone()},
                }),
            },
            ToolSpec {
                name: "search_knowledge_base",
                description: "Search FAQs and policies. Use for how-to, billing, refund and policy questions.",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": {"type": "string", "description": "What to search for."}
                    },
                    "required": ["query"],
                }),
            },
            ToolSpec {
                name: "create_support_ticket",
                description: "Open a support ticket for an issue that needs follow-up or escalation.",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "phone": phone.clone(),
                        "issue": {
                            "type": "string",
                            "description": "Short description of the problem."
                        },
                        "priority": {"type": "string", "enum": ["low", "medium", "high"]}
                    },
                    "required": ["issue"],
                }),
            },
            ToolSpec {
                name: "get_customer_tickets",
                description: "List a customer's previous support tickets, newest first.",
                parameters: json!({
                    "type": "object",
                    "properties": {"phone": phone.clone()},
                }),
            },
            ToolSpec {
                name: "update_account_status",
                description: "Change a customer's account status, for example to cancel or reactivate it.",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "phone": phone.clone(),
                        "status": {"type": "string", "enum": ["active", "suspended", "cancelled"]}
                    },
                    "required": ["status"],
                }),
            },
        ]
    }

    /// Runs one tool call and returns its text result. Never fails.
    pub async fn execute(&self, ctx: &ToolContext, call: &ToolCall) -> String {
        match self.dispatch(ctx, call).await {
            Ok(text) => {
                tracing::info!(
                    tool = %call.name,
                    call_id = %call.id,
                    result_len = text.len(),
                    "tool executed"
                );
                text
            }
            Err(err) => {
                tracing::warn!(
                    tool = %call.name,
                    call_id = %call.id,
                    error = %err,
                    "tool failed"
                );
                format!("{TOOL_ERROR_MARKER} {err}")
            }
        }
    }

    async fn bounded<T, E, F>(&self, tool: &'static str, fut: F) -> Result<Result<T, E>, ToolError>
    where
        F: Future<Output = Result<T, E>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| ToolError::Timeout {
                tool,
                limit: self.timeout,
            })
    }

    async fn records<T, F>(&self, tool: &'static str, fut: F) -> Result<T, ToolError>
    where
        F: Future<Output = Result<T, RecordError>>,
    {
        self.bounded(tool, fut)
            .await?
            .map_err(|source| ToolError::Records { tool, source })
    }

    async fn committed<T, F>(&self, tool: &'static str, fut: F) -> Result<T, ToolError>
    where
        F: Future<Output = Result<T, RecordError>>,
    {
        let started = Instant::now();
        let result = fut.await;
        let elapsed = started.elapsed();
        if elapsed > self.timeout {
            tracing::warn!(
                tool,
                ?elapsed,
                limit = ?self.timeout,
                "write outlasted the tool timeout"
            );
        }
        result.map_err(|source| ToolError::Records { tool, source })
    }

    async fn dispatch(&self, ctx: &ToolContext, call: &ToolCall) -> Result<String, ToolError> {
        match call.name.as_str() {
            "get_customer_info" => {
                const TOOL: &str = "get_customer_info";
                let args: PhoneArgs = parse_args(TOOL, &call.arguments)?;
                let phone = resolve_phone(ctx, args.phone);
                match self.records(TOOL, self.accounts.customer(&phone)).await? {
                    Some(customer) => to_json_text(TOOL, &customer),
                    None => Ok("Customer not found in database.".to_string()),
                }
            }
            "search_knowledge_base" => {
                const TOOL: &str = "search_knowledge_base";
                let args: SearchArgs = parse_args(TOOL, &call.arguments)?;
                if args.query.trim().is_empty() {
                    return Err(ToolError::InvalidArguments {
                        tool: TOOL,
                        reason: "query must not be empty".to_string(),
                    });
                }
                let passages = self
                    .bounded(TOOL, self.knowledge.search(&args.query, self.search_limit))
                    .await?
                    .map_err(|source| ToolError::Knowledge { tool: TOOL, source })?;
                if passages.is_empty() {
                    Ok("No relevant information found in knowledge base.".to_string())
                } else {
                    Ok(passages.join(PASSAGE_SEPARATOR))
                }
            }
            "create_support_ticket" => {
                const TOOL: &str = "create_support_ticket";
                let args: TicketArgs = parse_args(TOOL, &call.arguments)?;
                if args.issue.trim().is_empty() {
                    return Err(ToolError::InvalidArguments {
                        tool: TOOL,
                        reason: "issue must not be empty".to_string(),
                    });
                }
                let priority = match args.priority.as_deref() {
                    Some(p) if !p.trim().is_empty() => parse_label(TOOL, "priority", p)?,
                    _ => TicketPriority::default(),
                };
                let phone = resolve_phone(ctx, args.phone);
                let write = self.accounts.open_ticket(&phone, args.issue.trim(), priority);
                let id = self.committed(TOOL, write).await?;
                Ok(format!(
                    "Support ticket created successfully. Ticket ID: {id}. \
                     The customer will be contacted within 24 hours."
                ))
            }
            "get_customer_tickets" => {
                const TOOL: &str = "get_customer_tickets";
                let args: PhoneArgs = parse_args(TOOL, &call.arguments)?;
                let phone = resolve_phone(ctx, args.phone);
                let tickets = self.records(TOOL, self.accounts.tickets(&phone)).await?;
                if tickets.is_empty() {
                    Ok("No previous support tickets found for this customer.".to_string())
                } else {
                    to_json_text(TOOL, &tickets)
                }
            }
            "update_account_status" => {
                const TOOL: &str = "update_account_status";
                let args: StatusArgs = parse_args(TOOL, &call.arguments)?;
                let status: AccountStatus = parse_label(TOOL, "status", &args.status)?;
                let phone = resolve_phone(ctx, args.phone);
                match self
                    .committed(TOOL, self.accounts.set_customer_status(&phone, status))
                    .await?
                {
                    Some(customer) => Ok(format!(
                        "Account status successfully updated to '{status}' for {}.",
                        customer.name
                    )),
                    None => Ok("Customer not found. Could not update account status.".to_string()),
                }
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}
