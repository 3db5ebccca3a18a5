//! Startup wiring shared by the server and console binaries.

use callcenter_agent::{AgentLoop, ChatModel, ConversationMemory, OpenAiCompatModel, ToolRegistry};
use callcenter_db::{
    create_pool, run_migrations, DbPool, DbRuntimeSettings, MigrationError, PoolError,
};
use callcenter_knowledge::{default_faqs, KnowledgeError, SqliteKnowledgeIndex};
use callcenter_records::SqliteRecordStore;
use callcenter_voice::CallController;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, DatabaseConfig, KnowledgeConfig, LoggingConfig};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to create database pool: {0}")]
    Pool(#[from] PoolError),

    #[error("failed to get database connection: {0}")]
    Connection(#[from] r2d2::Error),

    #[error("failed to run database migrations: {0}")]
    Migration(#[from] MigrationError),

    #[error("failed to seed knowledge base: {0}")]
    Knowledge(#[from] KnowledgeError),
}

/// Installs the global tracing subscriber. `json` switches to JSON lines.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Opens the pool and brings the schema up to date.
pub fn open_database(database: &DatabaseConfig) -> Result<DbPool, BootstrapError> {
    let pool = create_pool(
        &database.path,
        DbRuntimeSettings {
            busy_timeout_ms: database.busy_timeout_ms,
            pool_max_size: database.pool_max_size,
        },
    )?;

    let conn = pool.get()?;
    let applied = run_migrations(&conn)?;
    if applied > 0 {
        tracing::info!(count = applied, "applied database migrations");
    }
    Ok(pool)
}

/// Fills an empty knowledge base from `seed_path`, or the built-in FAQs.
pub async fn seed_knowledge(
    index: &SqliteKnowledgeIndex,
    knowledge: &KnowledgeConfig,
) -> Result<usize, BootstrapError> {
    let docs = match &knowledge.seed_path {
        Some(path) => {
            tracing::info!(path = %path, "loading knowledge seed file");
            SqliteKnowledgeIndex::load_seed_file(path).await?
        }
        None => default_faqs(),
    };
    Ok(index.seed_if_empty(docs).await?)
}

/// Builds the call controller over the shared pool and the given model.
pub fn build_controller(
    config: &Config,
    pool: DbPool,
    model: Arc<dyn ChatModel>,
) -> CallController {
    let records = Arc::new(SqliteRecordStore::new(pool.clone()));
    let knowledge = Arc::new(SqliteKnowledgeIndex::new(pool));

    let tools = ToolRegistry::new(records.clone(), knowledge)
        .with_timeout(Duration::from_secs(config.agent.tool_timeout_secs))
        .with_search_limit(config.agent.search_limit);
    let agent = AgentLoop::new(model, tools)
        .with_max_rounds(config.agent.max_rounds)
        .with_model_timeout(Duration::from_secs(config.model.timeout_secs));
    let memory = ConversationMemory::new(records).with_history_limit(config.agent.history_limit);

    CallController::new(agent, memory, config.voice.clone())
}

/// Full startup sequence after tracing is installed: database, knowledge
/// seed, model client, controller.
pub async fn bootstrap(config: &Config) -> Result<CallController, BootstrapError> {
    let pool = open_database(&config.database)?;

    let index = SqliteKnowledgeIndex::new(pool.clone());
    let seeded = seed_knowledge(&index, &config.knowledge).await?;
    if seeded > 0 {
        tracing::info!(count = seeded, "seeded knowledge base");
    }

    if config.model.api_key.is_none() {
        tracing::warn!("no model API key configured; requests will be sent unauthenticated");
    }
    let model = Arc::new(OpenAiCompatModel::new(config.model.clone()));
    tracing::info!(
        model = %config.model.model,
        endpoint = %config.model.endpoint,
        "model client ready"
    );

    Ok(build_controller(config, pool, model))
}

/// Config path from CLI arg 1, then `CALLCENTER_CONFIG_PATH`, then `None`.
pub fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("CALLCENTER_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}
