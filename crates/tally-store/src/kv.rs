//! # Key-Value Store
//!
//! The string-keyed storage every document lives in.
//!
//! ## Adapters
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      KeyValueStore (trait)                              │
//! │          get(key) │ set(key, value) │ remove(key) │ clear()             │
//! │                                                                         │
//! │   ┌───────────────────────┐        ┌───────────────────────────────┐   │
//! │   │  MemoryStore          │        │  SqliteStore (pool.rs)        │   │
//! │   │  RwLock<HashMap>      │        │  kv_store table, UPSERT       │   │
//! │   │  tests, demos         │        │  durable, WAL                 │   │
//! │   └───────────────────────┘        └───────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each `set` replaces a key's value wholesale; there is no partial write
//! and no transaction spanning two keys.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreResult;

/// Async string-keyed storage.
///
/// Implementations must be cheap to clone: repositories hold their own
/// handle to the same underlying store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value under `key`, or `None` when absent.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> StoreResult<()>;

    /// Removes every key, including ones owned by other parts of the app.
    async fn clear(&self) -> StoreResult<()>;
}

// =============================================================================
// Memory Store
// =============================================================================

/// In-process store backed by a `HashMap`. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
