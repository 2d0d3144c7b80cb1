use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::Store;

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn is_under(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    path == prefix || path.starts_with(&format!("{prefix}/"))
}

/// Write-through cache over any [`Store`] backend.
///
/// Reads are served from an in-memory mirror; writes go to the backing
/// store first and only land in the mirror once durable. A `RwLock`
/// guards the mirror: readers never block readers, and a write holds the
/// lock for the duration of both the backing-store call and the mirror
/// update so no reader can observe a write that hasn't yet reached the
/// backend.
pub struct CachedStore<S: Store> {
    backing: S,
    mirror: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl<S: Store> CachedStore<S> {
    /// Wrap `backing`, populating the mirror from its current contents.
    pub async fn warm(backing: S) -> Result<Self, StoreError> {
        let mut mirror = HashMap::new();
        let mut stack = vec![String::new()];
        while let Some(path) = stack.pop() {
            for child in backing.get_children(&path).await? {
                let child_path = if path.is_empty() {
                    child
                } else {
                    format!("{path}/{child}")
                };
                if let Some(bytes) = backing.get(&child_path).await? {
                    mirror.insert(child_path.clone(), bytes);
                }
                stack.push(child_path);
            }
        }
        Ok(Self {
            backing,
            mirror: Arc::new(RwLock::new(mirror)),
        })
    }

    /// Wrap `backing` assuming it starts empty, skipping the warm-up scan.
    pub fn new_empty(backing: S) -> Self {
        Self {
            backing,
            mirror: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl<S: Store> Store for CachedStore<S> {
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let guard = self.mirror.read().await;
        Ok(guard.get(&normalize(path)).cloned())
    }

    async fn get_children(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let prefix = normalize(path);
        let guard = self.mirror.read().await;
        let mut children: Vec<String> = Vec::new();
        for key in guard.keys() {
            if !is_under(key, &prefix) || key == &prefix {
                continue;
            }
            let rest = if prefix.is_empty() {
                key.as_str()
            } else {
                key[prefix.len() + 1..].as_ref()
            };
            if let Some(first) = rest.split('/').next() {
                let first = first.to_string();
                if !children.contains(&first) {
                    children.push(first);
                }
            }
        }
        children.sort();
        Ok(children)
    }

    async fn set(&self, path: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let key = normalize(path);
        let mut guard = self.mirror.write().await;
        self.backing.set(&key, bytes.clone()).await?;
        guard.insert(key, bytes);
        Ok(())
    }

    async fn set_many(&self, entries: HashMap<String, Vec<u8>>) -> Result<(), StoreError> {
        let normalized: HashMap<String, Vec<u8>> = entries
            .into_iter()
            .map(|(k, v)| (normalize(&k), v))
            .collect();
        let mut guard = self.mirror.write().await;
        self.backing.set_many(normalized.clone()).await?;
        guard.extend(normalized);
        Ok(())
    }

    async fn delete_all(&self, path: &str) -> Result<(), StoreError> {
        let prefix = normalize(path);
        let mut guard = self.mirror.write().await;
        self.backing.delete_all(&prefix).await?;
        guard.retain(|k, _| !is_under(k, &prefix));
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.backing.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;

    #[tokio::test]
    async fn writes_land_in_backing_and_mirror() {
        let cached = CachedStore::new_empty(InMemoryStore::new());
        cached.set("FrameworkId", b"f".to_vec()).await.unwrap();
        assert_eq!(cached.get("FrameworkId").await.unwrap(), Some(b"f".to_vec()));
    }

    #[tokio::test]
    async fn warm_populates_mirror_from_existing_backend() {
        let backing = InMemoryStore::new();
        backing.set("Tasks/a/info", b"x".to_vec()).await.unwrap();
        let cached = CachedStore::warm(backing).await.unwrap();
        assert_eq!(cached.get("Tasks/a/info").await.unwrap(), Some(b"x".to_vec()));
        assert_eq!(cached.get_children("Tasks").await.unwrap(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn delete_all_clears_mirror_and_backend() {
        let cached = CachedStore::new_empty(InMemoryStore::new());
        cached.set("Tasks/a/info", b"x".to_vec()).await.unwrap();
        cached.delete_all("Tasks").await.unwrap();
        assert_eq!(cached.get("Tasks/a/info").await.unwrap(), None);
    }
}
