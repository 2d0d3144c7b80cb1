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

/// In-memory implementation of [`Store`].
///
/// All data is lost on process exit. Suitable for tests and the
/// `--simulate` CLI mode.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.get(&normalize(path)).cloned())
    }

    async fn get_children(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let prefix = normalize(path);
        let guard = self.inner.read().await;
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
        let mut guard = self.inner.write().await;
        guard.insert(normalize(path), bytes);
        Ok(())
    }

    async fn set_many(&self, entries: HashMap<String, Vec<u8>>) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        for (path, bytes) in entries {
            guard.insert(normalize(&path), bytes);
        }
        Ok(())
    }

    async fn delete_all(&self, path: &str) -> Result<(), StoreError> {
        let prefix = normalize(path);
        let mut guard = self.inner.write().await;
        guard.retain(|k, _| !is_under(k, &prefix));
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_and_get() {
        let store = InMemoryStore::new();
        store.set("Tasks/a/info", b"x".to_vec()).await.unwrap();
        assert_eq!(store.get("Tasks/a/info").await.unwrap(), Some(b"x".to_vec()));
    }

    #[tokio::test]
    async fn get_children_returns_immediate_names_only() {
        let store = InMemoryStore::new();
        store.set("Tasks/a/info", b"x".to_vec()).await.unwrap();
        store.set("Tasks/b/info", b"y".to_vec()).await.unwrap();
        let mut children = store.get_children("Tasks").await.unwrap();
        children.sort();
        assert_eq!(children, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn delete_all_removes_subtree() {
        let store = InMemoryStore::new();
        store.set("Tasks/a/info", b"x".to_vec()).await.unwrap();
        store.set("Tasks/a/status", b"y".to_vec()).await.unwrap();
        store.set("FrameworkId", b"f".to_vec()).await.unwrap();
        store.delete_all("Tasks").await.unwrap();
        assert_eq!(store.get("Tasks/a/info").await.unwrap(), None);
        assert_eq!(store.get("FrameworkId").await.unwrap(), Some(b"f".to_vec()));
    }

    #[tokio::test]
    async fn set_many_is_applied_in_one_shot() {
        let store = InMemoryStore::new();
        let mut entries = HashMap::new();
        entries.insert("a".to_string(), b"1".to_vec());
        entries.insert("b".to_string(), b"2".to_vec());
        store.set_many(entries).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get("b").await.unwrap(), Some(b"2".to_vec()));
    }
}
