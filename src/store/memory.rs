use std::collections::HashMap;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{SessionStore, StoreError, StoreKey};

#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<StoreKey, Value>>,
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, key: StoreKey) -> Result<Option<Value>, StoreError> {
        Ok(self.docs.read().await.get(&key).cloned())
    }

    async fn save(&self, key: StoreKey, value: &Value) -> Result<(), StoreError> {
        self.docs.write().await.insert(key, value.clone());
        Ok(())
    }

    async fn clear(&self, key: StoreKey) -> Result<(), StoreError> {
        self.docs.write().await.remove(&key);
        Ok(())
    }

    async fn save_all(&self, entries: &[(StoreKey, Value)]) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        for (key, value) in entries {
            docs.insert(*key, value.clone());
        }
        Ok(())
    }
}

/// Memory store whose writes can be switched to fail.
#[cfg(test)]
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    failing: AtomicBool,
}

#[cfg(test)]
impl FlakyStore {
    pub fn set_failing(&self, on: bool) {
        self.failing.store(on, Ordering::SeqCst);
    }

    fn check(&self, key: StoreKey) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Io {
                key,
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[async_trait]
impl SessionStore for FlakyStore {
    async fn load(&self, key: StoreKey) -> Result<Option<Value>, StoreError> {
        self.inner.load(key).await
    }

    async fn save(&self, key: StoreKey, value: &Value) -> Result<(), StoreError> {
        self.check(key)?;
        self.inner.save(key, value).await
    }

    async fn clear(&self, key: StoreKey) -> Result<(), StoreError> {
        self.check(key)?;
        self.inner.clear(key).await
    }

    async fn save_all(&self, entries: &[(StoreKey, Value)]) -> Result<(), StoreError> {
        self.check(entries.first().map_or(StoreKey::Profile, |(k, _)| *k))?;
        self.inner.save_all(entries).await
    }
}
