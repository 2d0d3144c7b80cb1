use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition};

use crate::error::StoreError;
use crate::store::Store;

const PATHS: TableDefinition<&str, &[u8]> = TableDefinition::new("paths");

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn is_under(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    path == prefix || path.starts_with(&format!("{prefix}/"))
}

fn internal<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Internal(e.to_string())
}

/// Persistent [`Store`] backed by a `redb` database file.
///
/// Survives process restarts — the contract the restart gate and
/// the idempotent rebuild-on-restart design depend
/// on.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open (or create) a redb database at `path`. Parent directories are
    /// created automatically.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(internal)?;
        }
        let db = Database::create(path).map_err(internal)?;
        {
            let wtxn = db.begin_write().map_err(internal)?;
            wtxn.open_table(PATHS).map_err(internal)?;
            wtxn.commit().map_err(internal)?;
        }
        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait]
impl Store for RedbStore {
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let key = normalize(path);
        let rtxn = self.db.begin_read().map_err(internal)?;
        let table = rtxn.open_table(PATHS).map_err(internal)?;
        match table.get(key.as_str()).map_err(internal)? {
            Some(g) => Ok(Some(g.value().to_vec())),
            None => Ok(None),
        }
    }

    async fn get_children(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let prefix = normalize(path);
        let rtxn = self.db.begin_read().map_err(internal)?;
        let table = rtxn.open_table(PATHS).map_err(internal)?;
        let mut children: Vec<String> = Vec::new();
        for entry in table.iter().map_err(internal)? {
            let (k, _v) = entry.map_err(internal)?;
            let key = k.value();
            if !is_under(key, &prefix) || key == prefix {
                continue;
            }
            let rest = if prefix.is_empty() {
                key
            } else {
                &key[prefix.len() + 1..]
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
        let wtxn = self.db.begin_write().map_err(internal)?;
        {
            let mut table = wtxn.open_table(PATHS).map_err(internal)?;
            table.insert(key.as_str(), bytes.as_slice()).map_err(internal)?;
        }
        wtxn.commit().map_err(internal)?;
        Ok(())
    }

    async fn set_many(&self, entries: HashMap<String, Vec<u8>>) -> Result<(), StoreError> {
        let wtxn = self.db.begin_write().map_err(internal)?;
        {
            let mut table = wtxn.open_table(PATHS).map_err(internal)?;
            for (path, bytes) in &entries {
                table
                    .insert(normalize(path).as_str(), bytes.as_slice())
                    .map_err(internal)?;
            }
        }
        wtxn.commit().map_err(internal)?;
        Ok(())
    }

    async fn delete_all(&self, path: &str) -> Result<(), StoreError> {
        let prefix = normalize(path);
        let wtxn = self.db.begin_write().map_err(internal)?;
        {
            let mut table = wtxn.open_table(PATHS).map_err(internal)?;
            let to_remove: Vec<String> = table
                .iter()
                .map_err(internal)?
                .filter_map(|e| e.ok())
                .map(|(k, _)| k.value().to_string())
                .filter(|k| is_under(k, &prefix))
                .collect();
            for key in to_remove {
                table.remove(key.as_str()).map_err(internal)?;
            }
        }
        wtxn.commit().map_err(internal)?;
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
