use std::sync::Arc;

use tokio::sync::Mutex;

use scuttle_domain::{AuditEvent, FrameworkId, TaskName, TaskRecord, TaskStatusKind};

use crate::error::StoreError;
use crate::store::Store;

const FRAMEWORK_ID_PATH: &str = "FrameworkId";
const TASKS_PATH: &str = "Tasks";
const EVENTS_PATH: &str = "Events";
const DESIRED_HASH_PATH: &str = "DesiredHash";

fn task_path(name: &TaskName) -> String {
    format!("{TASKS_PATH}/{}", name.as_str())
}

/// Typed, domain-aware view over a [`Store`], covering the persisted
/// layout the coordinator actually reads and writes:
///
/// ```text
/// FrameworkId
/// Tasks/<name>      (one `TaskRecord` per task, JSON-encoded)
/// ```
///
/// Individual `Store` calls are each internally synchronized, but
/// sequences like "read a `TaskRecord`, tombstone one of its resources,
/// write it back" are not atomic unless something above the raw trait
/// serializes them. This layer adds that serialization with its own
/// lock, so two concurrent tombstone operations against the same task
/// can never race and drop one of the writes. In this coordinator the
/// offer callback is the sole writer, so the lock is never actually
/// contended — it exists to make the compound-operation contract
/// correct regardless of who calls it.
pub struct ServiceStateStore<S: Store> {
    store: S,
    write_guard: Mutex<()>,
}

impl<S: Store> ServiceStateStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_guard: Mutex::new(()),
        }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    pub async fn get_framework_id(&self) -> Result<Option<FrameworkId>, StoreError> {
        match self.store.get(FRAMEWORK_ID_PATH).await? {
            Some(bytes) => {
                let id = String::from_utf8(bytes)
                    .map_err(|e| StoreError::Internal(e.to_string()))?;
                Ok(Some(FrameworkId::new(id)))
            }
            None => Ok(None),
        }
    }

    pub async fn set_framework_id(&self, id: &FrameworkId) -> Result<(), StoreError> {
        let _guard = self.write_guard.lock().await;
        self.store
            .set(FRAMEWORK_ID_PATH, id.as_str().as_bytes().to_vec())
            .await
    }

    pub async fn get_task(&self, name: &TaskName) -> Result<Option<TaskRecord>, StoreError> {
        match self.store.get(&task_path(name)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn put_task(&self, record: &TaskRecord) -> Result<(), StoreError> {
        let _guard = self.write_guard.lock().await;
        let bytes = serde_json::to_vec(record)?;
        self.store.set(&task_path(&record.name), bytes).await
    }

    /// All persisted task records, in no particular order.
    pub async fn list_tasks(&self) -> Result<Vec<TaskRecord>, StoreError> {
        let names = self.store.get_children(TASKS_PATH).await?;
        let mut records = Vec::with_capacity(names.len());
        for name in names {
            let path = format!("{TASKS_PATH}/{name}");
            if let Some(bytes) = self.store.get(&path).await? {
                records.push(serde_json::from_slice(&bytes)?);
            }
        }
        Ok(records)
    }

    /// Find the task record owning `task_id`, the master's instance
    /// identifier, as opposed to the stable task name.
    pub async fn resolve_task_by_id(&self, task_id: &str) -> Result<Option<TaskRecord>, StoreError> {
        Ok(self
            .list_tasks()
            .await?
            .into_iter()
            .find(|t| t.task_id == task_id))
    }

    /// Read-modify-write: rewrite every resource reservation ID held by
    /// `name` to its tombstoned form. A no-op (but not an error) if the
    /// task is already fully released or unknown.
    pub async fn tombstone_task_resources(&self, name: &TaskName) -> Result<(), StoreError> {
        let _guard = self.write_guard.lock().await;
        let path = task_path(name);
        let Some(bytes) = self.store.get(&path).await? else {
            return Ok(());
        };
        let mut record: TaskRecord = serde_json::from_slice(&bytes)?;
        for resource in &mut record.resources {
            resource.reservation_id = resource.reservation_id.tombstoned();
        }
        let bytes = serde_json::to_vec(&record)?;
        self.store.set(&path, bytes).await
    }

    /// Read-modify-write: rewrite only the resources matching
    /// `reservation_id` to their tombstoned form, across every task that
    /// owns one (a reservation can be shared, e.g. a volume mounted by
    /// two tasks). Returns the names of the tasks actually touched; an
    /// empty result means the reservation was already tombstoned
    /// everywhere or unknown to the store (an InvariantViolation for the
    /// caller to log — not an error here).
    pub async fn tombstone_resource(
        &self,
        reservation_id: &scuttle_domain::ReservationId,
    ) -> Result<Vec<TaskName>, StoreError> {
        let _guard = self.write_guard.lock().await;
        let names = self.store.get_children(TASKS_PATH).await?;
        let mut affected = Vec::new();
        for name in names {
            let path = format!("{TASKS_PATH}/{name}");
            let Some(bytes) = self.store.get(&path).await? else {
                continue;
            };
            let mut record: TaskRecord = serde_json::from_slice(&bytes)?;
            let mut touched = false;
            for resource in &mut record.resources {
                if &resource.reservation_id == reservation_id && !resource.is_released() {
                    resource.reservation_id = resource.reservation_id.tombstoned();
                    touched = true;
                }
            }
            if touched {
                let bytes = serde_json::to_vec(&record)?;
                self.store.set(&path, bytes).await?;
                affected.push(record.name);
            }
        }
        Ok(affected)
    }

    /// Record the latest status observed for `name`, keeping the rest of
    /// the record intact. A no-op if the task is unknown to the store.
    pub async fn record_task_status(
        &self,
        name: &TaskName,
        status: TaskStatusKind,
    ) -> Result<(), StoreError> {
        let _guard = self.write_guard.lock().await;
        let path = task_path(name);
        let Some(bytes) = self.store.get(&path).await? else {
            return Ok(());
        };
        let mut record: TaskRecord = serde_json::from_slice(&bytes)?;
        record.last_status = Some(status);
        let bytes = serde_json::to_vec(&record)?;
        self.store.set(&path, bytes).await
    }

    /// Append one audit event (E3: a durable home for step-completion and
    /// InvariantViolation signals, parallel to the plan itself). Append-only
    /// — events are never rewritten, only wiped wholesale by
    /// [`Self::clear_all`] once the uninstall finishes.
    pub async fn append_event(&self, event: &AuditEvent) -> Result<(), StoreError> {
        let _guard = self.write_guard.lock().await;
        let path = format!("{EVENTS_PATH}/{}", event.id);
        let bytes = serde_json::to_vec(event)?;
        self.store.set(&path, bytes).await
    }

    /// All persisted audit events, oldest first.
    pub async fn list_events(&self) -> Result<Vec<AuditEvent>, StoreError> {
        let names = self.store.get_children(EVENTS_PATH).await?;
        let mut events = Vec::with_capacity(names.len());
        for name in names {
            let path = format!("{EVENTS_PATH}/{name}");
            if let Some(bytes) = self.store.get(&path).await? {
                events.push(serde_json::from_slice(&bytes)?);
            }
        }
        events.sort_by_key(|e: &AuditEvent| e.at);
        Ok(events)
    }

    /// The desired-config hash recorded at the last successful plan
    /// build, if any. `None` on a store that has never built a plan.
    pub async fn get_desired_hash(&self) -> Result<Option<String>, StoreError> {
        match self.store.get(DESIRED_HASH_PATH).await? {
            Some(bytes) => Ok(Some(
                String::from_utf8(bytes).map_err(|e| StoreError::Internal(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    /// Record the desired-config hash for the plan just built, overwriting
    /// whatever was recorded on a prior run.
    pub async fn set_desired_hash(&self, hash: &str) -> Result<(), StoreError> {
        let _guard = self.write_guard.lock().await;
        self.store
            .set(DESIRED_HASH_PATH, hash.as_bytes().to_vec())
            .await
    }

    /// Wipe all persisted service state. Called once deregistration has
    /// succeeded — the whole point being that a restart after this
    /// point starts clean rather than replaying a finished uninstall.
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        let _guard = self.write_guard.lock().await;
        self.store.delete_all("").await
    }
}

impl<S: Store> ServiceStateStore<S> {
    pub fn shared(store: S) -> Arc<Self> {
        Arc::new(Self::new(store))
    }
}
