use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::StoreError;

/// The persistent key-value store consumed by the coordinator.
///
/// Paths are '/'-separated strings, e.g. `"Tasks/broker-0/info"`. `set_many`
/// is atomic across all of its paths — either every path is written or none
/// is. Implementations are responsible for their own internal mutual
/// exclusion; callers never assume anything beyond read-your-writes.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Immediate child names under `path` (non-recursive).
    async fn get_children(&self, path: &str) -> Result<Vec<String>, StoreError>;

    async fn set(&self, path: &str, bytes: Vec<u8>) -> Result<(), StoreError>;

    /// Write every `(path, bytes)` pair atomically.
    async fn set_many(&self, entries: HashMap<String, Vec<u8>>) -> Result<(), StoreError>;

    /// Recursively delete everything at or under `path`.
    async fn delete_all(&self, path: &str) -> Result<(), StoreError>;

    async fn close(&self) -> Result<(), StoreError>;
}
