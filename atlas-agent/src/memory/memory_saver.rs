//! In-memory checkpointer. Dev and test default; also the fallback when a
//! durable checkpointer (e.g. `SqliteSaver`) fails to initialize.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::memory::checkpoint::{Checkpoint, CheckpointListItem};
use crate::memory::checkpointer::{CheckpointError, Checkpointer};
use crate::memory::config::RunnableConfig;

type ThreadKey = (String, String);

/// Non-persistent `Checkpointer`. All state lives in a `Mutex<HashMap>` and is
/// lost when the process exits.
pub struct MemorySaver<S> {
    checkpoints: Mutex<HashMap<ThreadKey, Vec<Checkpoint<S>>>>,
}

impl<S> Default for MemorySaver<S> {
    fn default() -> Self {
        Self {
            checkpoints: Mutex::new(HashMap::new()),
        }
    }
}

impl<S> MemorySaver<S> {
    pub fn new() -> Self {
        Self::default()
    }

    fn thread_id_required(config: &RunnableConfig) -> Result<String, CheckpointError> {
        config
            .thread_id
            .clone()
            .ok_or(CheckpointError::ThreadIdRequired)
    }
}

#[async_trait]
impl<S> Checkpointer<S> for MemorySaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError> {
        let thread_id = Self::thread_id_required(config)?;
        let key = (thread_id, config.checkpoint_ns.clone());
        let mut checkpoints = self
            .checkpoints
            .lock()
            .map_err(|_| CheckpointError::Storage("lock poisoned".into()))?;
        let list = checkpoints.entry(key).or_default();
        list.retain(|c| c.id != checkpoint.id);
        list.push(checkpoint.clone());
        Ok(checkpoint.id.clone())
    }

    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<(Checkpoint<S>, crate::memory::checkpoint::CheckpointMetadata)>, CheckpointError>
    {
        let thread_id = Self::thread_id_required(config)?;
        let key = (thread_id, config.checkpoint_ns.clone());
        let checkpoints = self
            .checkpoints
            .lock()
            .map_err(|_| CheckpointError::Storage("lock poisoned".into()))?;
        let Some(list) = checkpoints.get(&key) else {
            return Ok(None);
        };
        let found = match &config.checkpoint_id {
            Some(id) => list.iter().find(|c| &c.id == id),
            None => list.last(),
        };
        Ok(found.map(|c| (c.clone(), c.metadata.clone())))
    }

    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
        before: Option<&str>,
        after: Option<&str>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let thread_id = Self::thread_id_required(config)?;
        let key = (thread_id, config.checkpoint_ns.clone());
        let checkpoints = self
            .checkpoints
            .lock()
            .map_err(|_| CheckpointError::Storage("lock poisoned".into()))?;
        let mut items: Vec<CheckpointListItem> = checkpoints
            .get(&key)
            .map(|list| {
                list.iter()
                    .map(|c| CheckpointListItem {
                        checkpoint_id: c.id.clone(),
                        metadata: c.metadata.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        if let Some(a) = after {
            if let Some(pos) = items.iter().position(|i| i.checkpoint_id == a) {
                items = items[pos + 1..].to_vec();
            }
        }
        if let Some(b) = before {
            if let Some(pos) = items.iter().position(|i| i.checkpoint_id == b) {
                items = items[..pos].to_vec();
            }
        }
        if let Some(n) = limit {
            if items.len() > n {
                let start = items.len() - n;
                items = items[start..].to_vec();
            }
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::checkpoint::{CheckpointMetadata, CheckpointSource};

    fn sample_checkpoint(id: &str, step: i64) -> Checkpoint<String> {
        Checkpoint {
            v: crate::memory::checkpoint::CHECKPOINT_VERSION,
            id: id.to_string(),
            ts: "2026-01-01T00:00:00Z".to_string(),
            channel_values: "state".to_string(),
            channel_versions: HashMap::new(),
            versions_seen: HashMap::new(),
            updated_channels: None,
            pending_sends: Vec::new(),
            metadata: CheckpointMetadata {
                source: CheckpointSource::Loop,
                step,
                created_at: None,
                parents: HashMap::new(),
            },
        }
    }

    #[tokio::test]
    async fn put_then_get_tuple_returns_latest() {
        let saver = MemorySaver::<String>::new();
        let config = RunnableConfig::new("thread-1");
        saver.put(&config, &sample_checkpoint("a", 0)).await.unwrap();
        saver.put(&config, &sample_checkpoint("b", 1)).await.unwrap();
        let (checkpoint, _) = saver.get_tuple(&config).await.unwrap().unwrap();
        assert_eq!(checkpoint.id, "b");
    }

    #[tokio::test]
    async fn get_tuple_without_thread_id_errors() {
        let saver = MemorySaver::<String>::new();
        let config = RunnableConfig::default();
        let err = saver.get_tuple(&config).await.unwrap_err();
        assert!(matches!(err, CheckpointError::ThreadIdRequired));
    }

    #[tokio::test]
    async fn list_respects_limit() {
        let saver = MemorySaver::<String>::new();
        let config = RunnableConfig::new("thread-1");
        for i in 0..5 {
            saver
                .put(&config, &sample_checkpoint(&i.to_string(), i))
                .await
                .unwrap();
        }
        let items = saver.list(&config, Some(2), None, None).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].checkpoint_id, "4");
    }
}
