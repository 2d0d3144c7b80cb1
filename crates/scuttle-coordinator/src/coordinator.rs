use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use scuttle_domain::{AuditEvent, AuditEventKind, DeclineFilters, Offer, TaskName, TaskStatus};
use scuttle_driver::{clean_offers, Driver, DriverEvent, SecretsClient};
use scuttle_plan::{CandidateRef, PlanManager, StepKind};
use scuttle_store::{ServiceStateStore, Store};

use crate::error::CoordinatorError;
use crate::report::UninstallReport;

/// Component G: the offer-processing loop. Glues the driver's inbound
/// events to the plan manager, the resource cleaner, and the store.
/// Everything here runs on a single logical thread — the driver
/// guarantees events arrive one at a time.
pub struct Coordinator<D: Driver, S: Store> {
    driver: Arc<D>,
    store: Arc<ServiceStateStore<S>>,
    plan: Arc<Mutex<PlanManager>>,
    secrets_client: Option<Arc<dyn SecretsClient>>,
}

impl<D: Driver, S: Store> Coordinator<D, S> {
    pub fn new(
        driver: Arc<D>,
        store: Arc<ServiceStateStore<S>>,
        plan: Arc<Mutex<PlanManager>>,
        secrets_client: Option<Arc<dyn SecretsClient>>,
    ) -> Self {
        Self { driver, store, plan, secrets_client }
    }

    pub fn plan_handle(&self) -> Arc<Mutex<PlanManager>> {
        self.plan.clone()
    }

    pub async fn report(&self) -> UninstallReport {
        UninstallReport::from_plan(&*self.plan.lock().await)
    }

    async fn record_event(&self, kind: AuditEventKind) {
        let event = AuditEvent::new(Uuid::new_v4(), Utc::now(), kind);
        if let Err(e) = self.store.append_event(&event).await {
            error!(error = %e, "failed to persist audit event");
        }
    }

    /// Run the driver event loop until it disconnects. Each event is
    /// dispatched and any error is logged and absorbed (error propagation
    /// policy: the loop logs and continues to the next event — no error
    /// is fatal to the coordinator itself).
    pub async fn run(&self) {
        loop {
            match self.driver.next_event().await {
                DriverEvent::Offers(offers) => {
                    if let Err(e) = self.run_offer_cycle(offers).await {
                        warn!(error = %e, "offer cycle failed, will retry next cycle");
                    }
                }
                DriverEvent::Status(status) => {
                    if let Err(e) = self.handle_status(status).await {
                        warn!(error = %e, "status handling failed");
                    }
                }
                DriverEvent::Disconnected => {
                    info!("driver disconnected, pausing coordinator");
                    break;
                }
            }
        }
    }

    /// One offer cycle: decline ineligible offers, accept operations for candidates, handle the result.
    pub async fn run_offer_cycle(&self, offers: Vec<Offer>) -> Result<(), CoordinatorError> {
        self.advance_candidates().await?;

        let outcome = clean_offers(&offers);
        let filters = DeclineFilters::default();

        for accepted in outcome.accepted {
            self.driver.accept(vec![accepted.offer_id], accepted.operations, filters).await?;
        }
        for offer_id in outcome.unconsumed {
            self.driver.decline(offer_id, filters).await?;
        }

        Ok(())
    }

    /// Step 1: ask the plan for candidates, start each, and — for step
    /// kinds whose work is performed here rather than by the cleaner or
    /// the status callback — carry them all the way through.
    async fn advance_candidates(&self) -> Result<(), CoordinatorError> {
        let candidates: Vec<CandidateRef> = {
            let mut plan = self.plan.lock().await;
            plan.retry_errored_steps();
            plan.candidates()
        };

        for candidate in candidates {
            let kind = {
                let mut plan = self.plan.lock().await;
                let step = plan.step_at_mut(candidate);
                step.start();
                step.kind.clone()
            };

            match kind {
                StepKind::Kill { task_name } => self.advance_kill(candidate, &task_name).await?,
                StepKind::Release { .. } => {
                    // Left PREPARED; the cleaner below releases it if this
                    // cycle's offers happen to contain it, and the recorder
                    // confirms it — release steps don't block each other.
                }
                StepKind::TlsCleanup { namespace } => self.advance_tls_cleanup(candidate, &namespace).await?,
                StepKind::Deregister => self.advance_deregister(candidate).await?,
            }
        }

        Ok(())
    }

    async fn advance_kill(&self, candidate: CandidateRef, task_name: &TaskName) -> Result<(), CoordinatorError> {
        let Some(task) = self.store.get_task(task_name).await? else {
            // Nothing persisted for this task anymore (fully cleaned up
            // already) — treat the kill as vacuously done.
            let mut plan = self.plan.lock().await;
            plan.step_at_mut(candidate).confirm();
            return Ok(());
        };

        match self.driver.kill(task.task_id).await {
            Ok(()) => {
                let mut plan = self.plan.lock().await;
                plan.step_at_mut(candidate).submit();
            }
            Err(e) => {
                warn!(task = %task_name, error = %e, "kill rejected, will retry");
                let mut plan = self.plan.lock().await;
                plan.step_at_mut(candidate).fail();
            }
        }
        Ok(())
    }

    async fn advance_tls_cleanup(&self, candidate: CandidateRef, namespace: &str) -> Result<(), CoordinatorError> {
        let Some(client) = &self.secrets_client else {
            // Shouldn't happen — the builder only creates this phase when
            // a secrets client is configured — but fail safe rather than panic.
            let mut plan = self.plan.lock().await;
            plan.step_at_mut(candidate).fail();
            return Ok(());
        };

        let result: Result<(), scuttle_driver::DriverError> = async {
            let names = client.list(namespace).await?;
            for name in names {
                client.delete(namespace, &name).await?;
            }
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                let mut plan = self.plan.lock().await;
                let step = plan.step_at_mut(candidate);
                step.submit();
                step.confirm();
                self.record_event(AuditEventKind::StepCompleted { step: format!("tls-cleanup:{namespace}") })
                    .await;
            }
            Err(e) => {
                warn!(namespace, error = %e, "secrets cleanup failed, will retry");
                let mut plan = self.plan.lock().await;
                plan.step_at_mut(candidate).fail();
            }
        }
        Ok(())
    }

    async fn advance_deregister(&self, candidate: CandidateRef) -> Result<(), CoordinatorError> {
        match self.driver.deregister().await {
            Ok(()) => {
                self.store.clear_all().await?;
                let mut plan = self.plan.lock().await;
                let step = plan.step_at_mut(candidate);
                step.submit();
                step.confirm();
                drop(plan);
                self.record_event(AuditEventKind::PlanComplete).await;
            }
            Err(e) => {
                warn!(error = %e, "deregister rejected, will retry");
                let mut plan = self.plan.lock().await;
                plan.step_at_mut(candidate).fail();
            }
        }
        Ok(())
    }

    /// Step 4: persist every incoming task status, and advance the
    /// matching kill step to `COMPLETE` if the status is terminal.
    pub async fn handle_status(&self, status: TaskStatus) -> Result<(), CoordinatorError> {
        let Some(task) = self.store.resolve_task_by_id(&status.task_id).await? else {
            warn!(task_id = %status.task_id, "status for unknown task, ignoring");
            return Ok(());
        };

        self.store.record_task_status(&task.name, status.state).await?;

        if status.state.is_terminal() {
            let completed = {
                let mut plan = self.plan.lock().await;
                plan.complete_kill_step(&task.name)
            };
            if completed {
                self.record_event(AuditEventKind::StepCompleted { step: format!("kill:{}", task.name) }).await;
            }
        }

        Ok(())
    }
}
