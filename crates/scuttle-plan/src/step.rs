use serde::{Deserialize, Serialize};

use scuttle_domain::{ReservationId, TaskName};

/// Per-step lifecycle. Only `Pending` and `Prepared` steps are
/// candidates for work; `Waiting` exists for steps gated behind an
/// earlier phase (never itself a candidate, never mutated directly —
/// it's the status a `Pending` step in a non-active phase is *reported
/// as*, not a status stored on the step; see [`Phase::status`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Pending,
    Prepared,
    Starting,
    Complete,
    Error,
    Waiting,
}

impl StepStatus {
    /// Rank used to derive a phase's status from its children: the
    /// higher the rank, the further along. Ties broken toward less
    /// progress, so `Error` (which retries back to `Pending`) never
    /// makes a phase look more advanced than a step that's merely
    /// waiting its turn.
    pub(crate) fn progress_rank(self) -> u8 {
        match self {
            StepStatus::Complete => 5,
            StepStatus::Starting => 4,
            StepStatus::Prepared => 3,
            StepStatus::Pending => 2,
            StepStatus::Waiting => 2,
            StepStatus::Error => 1,
        }
    }

    pub fn is_candidate(self) -> bool {
        matches!(self, StepStatus::Pending | StepStatus::Prepared)
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepStatus::Pending => "PENDING",
            StepStatus::Prepared => "PREPARED",
            StepStatus::Starting => "STARTING",
            StepStatus::Complete => "COMPLETE",
            StepStatus::Error => "ERROR",
            StepStatus::Waiting => "WAITING",
        };
        write!(f, "{s}")
    }
}

/// Tagged step kinds (plan as data, not code). Each carries the
/// asset it acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum StepKind {
    Kill { task_name: TaskName },
    Release { reservation_id: ReservationId },
    TlsCleanup { namespace: String },
    Deregister,
}

impl StepKind {
    pub fn name(&self) -> String {
        match self {
            StepKind::Kill { task_name } => format!("kill:{}", task_name.as_str()),
            StepKind::Release { reservation_id } => format!("release:{}", reservation_id.as_str()),
            StepKind::TlsCleanup { namespace } => format!("tls-cleanup:{namespace}"),
            StepKind::Deregister => "deregister".to_string(),
        }
    }

    /// The real-world object identifier this step represents, if any
    /// (an optional asset identifier). `Deregister` has none — it is the terminal
    /// marker.
    pub fn asset_id(&self) -> Option<String> {
        match self {
            StepKind::Kill { task_name } => Some(task_name.as_str().to_string()),
            StepKind::Release { reservation_id } => Some(reservation_id.as_str().to_string()),
            StepKind::TlsCleanup { namespace } => Some(namespace.clone()),
            StepKind::Deregister => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub kind: StepKind,
    pub status: StepStatus,
}

impl Step {
    pub fn new(kind: StepKind) -> Self {
        Self {
            kind,
            status: StepStatus::Pending,
        }
    }

    pub fn name(&self) -> String {
        self.kind.name()
    }

    /// `PENDING --start()--> PREPARED`. Idempotent: calling it on an
    /// already-`Prepared` step (or anything past it) is a no-op.
    pub fn start(&mut self) {
        if self.status == StepStatus::Pending {
            self.status = StepStatus::Prepared;
        }
    }

    /// `PREPARED --submit(op)--> STARTING`: the operation has been
    /// handed to the driver. Some step kinds (release, confirmed
    /// directly by the recorder) skip this and go straight from
    /// `Prepared` to `Complete` via [`Step::confirm`].
    pub fn submit(&mut self) {
        if self.status == StepStatus::Prepared {
            self.status = StepStatus::Starting;
        }
    }

    /// `{PREPARED, STARTING} --confirm()--> COMPLETE`: the recorder (or,
    /// for kill steps, the status callback) observed the effect.
    /// Monotonic (I4): calling this on an already-`Complete` step is a
    /// no-op, never a backward transition.
    pub fn confirm(&mut self) {
        if matches!(self.status, StepStatus::Prepared | StepStatus::Starting) {
            self.status = StepStatus::Complete;
        }
    }

    /// `any --fail()--> ERROR`. Retryable — see [`Step::retry`].
    /// No-op once `Complete` — completion is monotonic.
    pub fn fail(&mut self) {
        if self.status != StepStatus::Complete {
            self.status = StepStatus::Error;
        }
    }

    /// `ERROR --retry()--> PENDING`, run once per tick over errored
    /// steps so they re-enter the candidate pool.
    pub fn retry(&mut self) {
        if self.status == StepStatus::Error {
            self.status = StepStatus::Pending;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == StepStatus::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kill_step() -> Step {
        Step::new(StepKind::Kill {
            task_name: TaskName::new("broker-0"),
        })
    }

    #[test]
    fn start_is_idempotent() {
        let mut s = kill_step();
        s.start();
        assert_eq!(s.status, StepStatus::Prepared);
        s.start();
        assert_eq!(s.status, StepStatus::Prepared);
    }

    #[test]
    fn full_happy_path() {
        let mut s = kill_step();
        s.start();
        s.submit();
        assert_eq!(s.status, StepStatus::Starting);
        s.confirm();
        assert_eq!(s.status, StepStatus::Complete);
    }

    #[test]
    fn confirm_from_prepared_skips_starting() {
        let mut s = kill_step();
        s.start();
        s.confirm();
        assert_eq!(s.status, StepStatus::Complete);
    }

    #[test]
    fn complete_is_monotonic() {
        let mut s = kill_step();
        s.start();
        s.submit();
        s.confirm();
        s.fail();
        assert_eq!(s.status, StepStatus::Complete, "complete must never leave once reached");
    }

    #[test]
    fn fail_then_retry_returns_to_pending() {
        let mut s = kill_step();
        s.start();
        s.fail();
        assert_eq!(s.status, StepStatus::Error);
        assert!(!s.status.is_candidate());
        s.retry();
        assert_eq!(s.status, StepStatus::Pending);
        assert!(s.status.is_candidate());
    }
}
