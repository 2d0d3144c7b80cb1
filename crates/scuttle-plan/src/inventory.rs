use std::collections::BTreeSet;

use scuttle_domain::{ReservationId, TaskName, TaskRecord};

/// The two target sets a plan is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceInventory {
    /// One entry per task that still needs killing: either it owns a
    /// non-tombstoned resource, or it is permanently-failed-in-error (and
    /// so will never be re-offered, but the master still needs the kill).
    pub kill_targets: BTreeSet<TaskName>,
    /// Distinct reservation IDs still needing release, across every task
    /// that isn't permanently-failed-in-error. Shared reservations
    /// (e.g. a volume mounted by two tasks) coalesce to one entry.
    pub release_targets: BTreeSet<ReservationId>,
}

impl ResourceInventory {
    /// Compute the inventory from the persisted task set. This is
    /// the only place kill/release targets are decided — the plan
    /// builder just turns these into steps.
    pub fn from_tasks(tasks: &[TaskRecord]) -> Self {
        let mut kill_targets = BTreeSet::new();
        let mut release_targets = BTreeSet::new();

        for task in tasks {
            if task.owns_unreleased_resource() || task.is_permanently_failed_in_error() {
                kill_targets.insert(task.name.clone());
            }
            if !task.is_permanently_failed_in_error() {
                for resource in &task.resources {
                    if !resource.is_released() {
                        release_targets.insert(resource.reservation_id.clone());
                    }
                }
            }
        }

        Self { kill_targets, release_targets }
    }

    pub fn is_empty(&self) -> bool {
        self.kill_targets.is_empty() && self.release_targets.is_empty()
    }
}
