//! Bounded per-caller conversation history.

use callcenter_records::{ConversationStore, RecordError};
use callcenter_types::{Role, Turn};
use std::sync::Arc;

const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("failed to load history for {identity}: {source}")]
    Load {
        identity: String,
        source: RecordError,
    },

    #[error("failed to persist exchange for {identity}: {source}")]
    Persist {
        identity: String,
        source: RecordError,
    },

    /// An exchange must be a caller turn followed by an agent turn.
    #[error("exchange must be caller then agent, got {caller} then {agent}")]
    InvalidExchange { caller: Role, agent: Role },
}

/// Loads and stores conversation turns keyed by caller identity.
#[derive(Clone)]
pub struct ConversationMemory {
    store: Arc<dyn ConversationStore>,
    history_limit: usize,
}

impl ConversationMemory {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self {
            store,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// The most recent turns for `identity`, oldest first, at most
    /// `history_limit` of them.
    pub async fn load(&self, identity: &str) -> Result<Vec<Turn>, MemoryError> {
        if self.history_limit == 0 {
            return Ok(Vec::new());
        }
        self.store
            .recent_turns(identity, self.history_limit)
            .await
            .map_err(|source| MemoryError::Load {
                identity: identity.to_string(),
                source,
            })
    }

    /// Persists one exchange. Both turns land or neither does.
    pub async fn append(
        &self,
        identity: &str,
        caller: &Turn,
        agent: &Turn,
    ) -> Result<(), MemoryError> {
        if caller.role != Role::Caller || agent.role != Role::Agent {
            return Err(MemoryError::InvalidExchange {
                caller: caller.role,
                agent: agent.role,
            });
        }
        self.store
            .append_exchange(identity, caller, agent)
            .await
            .map_err(|source| MemoryError::Persist {
                identity: identity.to_string(),
                source,
            })?;
        tracing::debug!(caller = %identity, "exchange persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        limits: Mutex<Vec<usize>>,
        appended: Mutex<Vec<(String, Turn, Turn)>>,
    }

    #[async_trait]
    impl ConversationStore for RecordingStore {
        async fn append_exchange(
            &self,
            phone: &str,
            caller: &Turn,
            agent: &Turn,
        ) -> Result<(), RecordError> {
            self.appended
                .lock()
                .unwrap()
                .push((phone.to_string(), caller.clone(), agent.clone()));
            Ok(())
        }

        async fn recent_turns(&self, _phone: &str, limit: usize) -> Result<Vec<Turn>, RecordError> {
            self.limits.lock().unwrap().push(limit);
            Ok(vec![Turn::caller("earlier"), Turn::agent("reply")])
        }
    }

    #[tokio::test]
    async fn load_passes_history_limit() {
        let store = Arc::new(RecordingStore::default());
        let memory = ConversationMemory::new(store.clone()).with_history_limit(4);

        let turns = memory.load("+1234567890").await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(*store.limits.lock().unwrap(), vec![4]);
    }

    #[tokio::test]
    async fn zero_limit_skips_store() {
        let store = Arc::new(RecordingStore::default());
        let memory = ConversationMemory::new(store.clone()).with_history_limit(0);

        assert!(memory.load("+1234567890").await.unwrap().is_empty());
        assert!(store.limits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_rejects_swapped_roles() {
        let store = Arc::new(RecordingStore::default());
        let memory = ConversationMemory::new(store.clone());

        let err = memory
            .append("+1234567890", &Turn::agent("hi"), &Turn::caller("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::InvalidExchange { .. }));
        assert!(store.appended.lock().unwrap().is_empty());

        memory
            .append("+1234567890", &Turn::caller("hello"), &Turn::agent("hi"))
            .await
            .unwrap();
        assert_eq!(store.appended.lock().unwrap().len(), 1);
    }
}
