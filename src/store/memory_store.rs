use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::TokenStore;
use crate::error::AppError;

/// In-process store. Expired entries read as absent and are removed lazily on
/// read or by [`TokenStore::purge_expired`].
#[derive(Default)]
pub struct MemoryTokenStore {
    /// key -> (value, deadline)
    entries: DashMap<String, (String, Instant)>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError> {
        let deadline = Instant::now() + ttl;
        self.entries
            .insert(key.to_string(), (value.to_string(), deadline));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if now < entry.value().1 => return Ok(Some(entry.value().0.clone())),
            Some(_) => {}
            None => return Ok(None),
        }

        self.entries.remove_if(key, |_, (_, deadline)| now >= *deadline);
        Ok(None)
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.entries.remove(key);
        Ok(())
    }

    fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, (_, deadline)| now < *deadline);
        before.saturating_sub(self.entries.len())
    }
}
