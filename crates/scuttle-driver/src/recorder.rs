use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use scuttle_domain::{AuditEvent, AuditEventKind, DeclineFilters, OfferId, Operation};
use scuttle_plan::PlanManager;
use scuttle_store::{ServiceStateStore, Store};

use crate::driver::{Driver, DriverEvent};
use crate::error::DriverError;

/// A decorator around any [`Driver`] (an observer on the
/// driver"): every other call is forwarded unchanged, but `accept` is
/// interposed on so that, once the master has actually accepted the
/// operations, this crate persists the tombstone *before* reporting
/// success to the caller. That ordering is what makes a crash between
/// "master accepted" and "step marked complete" safe — the next plan
/// rebuild sees the tombstone and simply omits the step (the idempotent
/// rebuild-on-restart behavior).
pub struct UninstallRecorder<D, S>
where
    D: Driver,
    S: Store,
{
    inner: D,
    store: Arc<ServiceStateStore<S>>,
    plan: Arc<Mutex<PlanManager>>,
}

impl<D, S> UninstallRecorder<D, S>
where
    D: Driver,
    S: Store,
{
    pub fn new(inner: D, store: Arc<ServiceStateStore<S>>, plan: Arc<Mutex<PlanManager>>) -> Self {
        Self { inner, store, plan }
    }

    /// Access the wrapped driver directly — mainly for tests that need
    /// to inspect a fake driver's recorded calls through the wrapper.
    pub fn inner(&self) -> &D {
        &self.inner
    }

    /// For every operation in an accepted batch, tombstone the matching
    /// persisted resource(s) and mark the corresponding release step
    /// complete. An operation whose reservation ID matches no persisted
    /// task resource is an invariant violation: logged at error, but
    /// uninstall proceeds regardless — the master's acceptance is ground
    /// truth, not the store's bookkeeping. A `Volume` resource yields two
    /// operations (`Destroy` then `Unreserve`) against the same
    /// reservation ID in one batch; the second one finds it already
    /// tombstoned by the first, which is expected and not a violation.
    async fn record(&self, operations: &[Operation]) {
        let mut already_tombstoned_this_batch = std::collections::HashSet::new();
        for op in operations {
            let reservation_id = op.reservation_id();
            if !already_tombstoned_this_batch.contains(reservation_id) {
                match self.store.tombstone_resource(reservation_id).await {
                    Ok(affected) if affected.is_empty() => {
                        error!(
                            reservation_id = %reservation_id,
                            "InvariantViolation: accepted operation has no matching persisted resource"
                        );
                    }
                    Ok(affected) => {
                        info!(reservation_id = %reservation_id, tasks = ?affected, "tombstoned reservation");
                    }
                    Err(e) => {
                        error!(reservation_id = %reservation_id, error = %e, "failed to persist tombstone");
                    }
                }
                already_tombstoned_this_batch.insert(reservation_id.clone());
            }

            let completed = {
                let mut plan = self.plan.lock().await;
                plan.complete_release_step(reservation_id)
            };

            let event = if completed {
                AuditEvent::new(
                    Uuid::new_v4(),
                    Utc::now(),
                    AuditEventKind::StepCompleted { step: format!("release:{reservation_id}") },
                )
            } else {
                error!(
                    reservation_id = %reservation_id,
                    "InvariantViolation: accepted operation has no matching release step"
                );
                AuditEvent::new(
                    Uuid::new_v4(),
                    Utc::now(),
                    AuditEventKind::StepErrored {
                        step: format!("release:{reservation_id}"),
                        message: "no matching release step in plan".to_string(),
                    },
                )
            };
            if let Err(e) = self.store.append_event(&event).await {
                error!(error = %e, "failed to persist audit event");
            }
        }
    }
}

#[async_trait]
impl<D, S> Driver for UninstallRecorder<D, S>
where
    D: Driver,
    S: Store,
{
    async fn next_event(&self) -> DriverEvent {
        self.inner.next_event().await
    }

    async fn accept(
        &self,
        offer_ids: Vec<OfferId>,
        operations: Vec<Operation>,
        filters: DeclineFilters,
    ) -> Result<(), DriverError> {
        self.inner.accept(offer_ids, operations.clone(), filters).await?;
        self.record(&operations).await;
        Ok(())
    }

    async fn decline(&self, offer_id: OfferId, filters: DeclineFilters) -> Result<(), DriverError> {
        self.inner.decline(offer_id, filters).await
    }

    async fn kill(&self, task_id: String) -> Result<(), DriverError> {
        self.inner.kill(task_id).await
    }

    async fn reconcile(&self, task_ids: Vec<String>) -> Result<(), DriverError> {
        self.inner.reconcile(task_ids).await
    }

    async fn deregister(&self) -> Result<(), DriverError> {
        self.inner.deregister().await
    }
}
