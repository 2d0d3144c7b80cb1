use scuttle_store::{ServiceStateStore, Store, StoreError};

/// Result of the restart gate: either there's real work left and
/// the scheduler should register with the master, or the process landed
/// on a store that's already fully torn down and registering would only
/// risk re-creating state a higher-level teardown is about to wipe
/// (a restarted process must not silently re-register a framework that was already torn down).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    Register,
    NothingToDo,
}

impl RestartDecision {
    pub fn should_register(self) -> bool {
        matches!(self, RestartDecision::Register)
    }
}

/// Component H. Checks, before registering with the master on process
/// start: is there any work left besides clearing the state store
/// itself? That's true unless **no framework ID is persisted** AND
/// **every persisted task resource is already tombstoned** — preserve
/// the AND of both signals; either alone is insufficient.
pub async fn decide_restart<S: Store>(
    store: &ServiceStateStore<S>,
) -> Result<RestartDecision, StoreError> {
    let framework_id_present = store.get_framework_id().await?.is_some();
    if framework_id_present {
        return Ok(RestartDecision::Register);
    }

    let tasks = store.list_tasks().await?;
    let all_tombstoned = tasks.iter().all(|t| t.resources.iter().all(|r| r.is_released()));

    if all_tombstoned {
        Ok(RestartDecision::NothingToDo)
    } else {
        Ok(RestartDecision::Register)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scuttle_domain::{FrameworkId, Resource, ResourceKind, TaskLabels, TaskName, TaskRecord, TaskStatusKind};
    use scuttle_store::InMemoryStore;

    fn task(name: &str, reservation: &str, tombstoned: bool) -> TaskRecord {
        let id = if tombstoned {
            scuttle_domain::ReservationId::new(reservation).tombstoned()
        } else {
            scuttle_domain::ReservationId::new(reservation)
        };
        TaskRecord {
            name: TaskName::new(name),
            task_id: format!("{name}-1"),
            resources: vec![Resource {
                reservation_id: id,
                kind: ResourceKind::Scalar,
                role: "svc-role".into(),
                principal: "svc-principal".into(),
                name: "cpus".into(),
            }],
            labels: TaskLabels::default(),
            last_status: Some(TaskStatusKind::Running),
        }
    }

    #[tokio::test]
    async fn empty_store_no_framework_id_is_nothing_to_do() {
        let store = ServiceStateStore::new(InMemoryStore::new());
        assert_eq!(decide_restart(&store).await.unwrap(), RestartDecision::NothingToDo);
    }

    #[tokio::test]
    async fn framework_id_present_always_registers_even_if_all_tombstoned() {
        let store = ServiceStateStore::new(InMemoryStore::new());
        store.put_task(&task("a", "r1", true)).await.unwrap();
        store.set_framework_id(&FrameworkId::new("fw-1")).await.unwrap();
        assert_eq!(decide_restart(&store).await.unwrap(), RestartDecision::Register);
    }

    #[tokio::test]
    async fn unreleased_resources_force_registration() {
        let store = ServiceStateStore::new(InMemoryStore::new());
        store.put_task(&task("a", "r1", false)).await.unwrap();
        assert_eq!(decide_restart(&store).await.unwrap(), RestartDecision::Register);
    }

    #[tokio::test]
    async fn all_tombstoned_and_no_framework_id_is_nothing_to_do() {
        let store = ServiceStateStore::new(InMemoryStore::new());
        store.put_task(&task("a", "r1", true)).await.unwrap();
        store.put_task(&task("b", "r2", true)).await.unwrap();
        assert_eq!(decide_restart(&store).await.unwrap(), RestartDecision::NothingToDo);
    }
}
