use serde::{Deserialize, Serialize};

use crate::step::{Step, StepStatus};

/// Within a phase, steps are either worked one at a time in a fixed
/// order (`Strict`: kill, deregister) or all at once (`Parallel`:
/// release, TLS cleanup).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseOrder {
    Strict,
    Parallel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseKind {
    Kill,
    Release,
    TlsCleanup,
    Deregister,
}

impl PhaseKind {
    pub fn order(self) -> PhaseOrder {
        match self {
            PhaseKind::Kill | PhaseKind::Deregister => PhaseOrder::Strict,
            PhaseKind::Release | PhaseKind::TlsCleanup => PhaseOrder::Parallel,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PhaseKind::Kill => "kill",
            PhaseKind::Release => "release",
            PhaseKind::TlsCleanup => "tls-cleanup",
            PhaseKind::Deregister => "deregister",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub kind: PhaseKind,
    pub steps: Vec<Step>,
}

impl Phase {
    pub fn new(kind: PhaseKind, steps: Vec<Step>) -> Self {
        Self { kind, steps }
    }

    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(Step::is_complete)
    }

    /// Derived status: `COMPLETE` iff every child is; otherwise the
    /// most in-progress child status among the non-complete children —
    /// the highest [`StepStatus::progress_rank`]. `Error` ranks below
    /// `Pending`/`Waiting` so a step that merely failed and will retry
    /// next tick doesn't make the phase look further along than one
    /// that's simply waiting its turn; that's the "ties broken toward
    /// less progress" rule in practice, since `Pending` and `Waiting`
    /// share a rank. An empty phase (shouldn't occur outside the
    /// trivial plan, which has no phases at all) is vacuously complete.
    pub fn status(&self) -> StepStatus {
        if self.steps.is_empty() || self.is_complete() {
            return StepStatus::Complete;
        }
        self.steps
            .iter()
            .map(|s| s.status)
            .filter(|s| *s != StepStatus::Complete)
            .max_by_key(|s| s.progress_rank())
            .unwrap_or(StepStatus::Pending)
    }

    /// Eligible (candidate) steps within this phase, honoring the
    /// phase's internal ordering: `Strict` phases surface only the
    /// first non-complete step; `Parallel` phases surface every
    /// candidate step.
    pub fn candidate_indices(&self) -> Vec<usize> {
        match self.kind.order() {
            PhaseOrder::Parallel => self
                .steps
                .iter()
                .enumerate()
                .filter(|(_, s)| s.status.is_candidate())
                .map(|(i, _)| i)
                .collect(),
            PhaseOrder::Strict => self
                .steps
                .iter()
                .position(|s| !s.is_complete())
                .filter(|&i| self.steps[i].status.is_candidate())
                .into_iter()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::StepKind;
    use scuttle_domain::TaskName;

    fn kill(name: &str) -> Step {
        Step::new(StepKind::Kill {
            task_name: TaskName::new(name),
        })
    }

    #[test]
    fn strict_phase_surfaces_only_first_incomplete_step() {
        let mut steps = vec![kill("a"), kill("b")];
        steps[0].status = StepStatus::Complete;
        let phase = Phase::new(PhaseKind::Kill, steps);
        assert_eq!(phase.candidate_indices(), vec![1]);
    }

    #[test]
    fn strict_phase_yields_no_candidate_while_first_step_in_flight() {
        let mut steps = vec![kill("a"), kill("b")];
        steps[0].status = StepStatus::Starting;
        let phase = Phase::new(PhaseKind::Kill, steps);
        assert!(phase.candidate_indices().is_empty());
    }

    #[test]
    fn parallel_phase_surfaces_every_candidate() {
        let mut steps = vec![kill("a"), kill("b"), kill("c")];
        steps[1].status = StepStatus::Starting;
        let phase = Phase::new(PhaseKind::Release, steps);
        assert_eq!(phase.candidate_indices(), vec![0, 2]);
    }

    #[test]
    fn status_is_complete_only_when_all_children_complete() {
        let mut steps = vec![kill("a"), kill("b")];
        steps[0].status = StepStatus::Complete;
        let phase = Phase::new(PhaseKind::Kill, steps);
        assert_eq!(phase.status(), StepStatus::Pending);
    }

    #[test]
    fn error_never_outranks_a_step_that_is_merely_pending() {
        let mut steps = vec![kill("a"), kill("b")];
        steps[0].status = StepStatus::Error;
        steps[1].status = StepStatus::Pending;
        let phase = Phase::new(PhaseKind::Kill, steps);
        assert_eq!(phase.status(), StepStatus::Pending);
    }

    #[test]
    fn most_advanced_non_complete_child_wins() {
        let mut steps = vec![kill("a"), kill("b"), kill("c")];
        steps[0].status = StepStatus::Pending;
        steps[1].status = StepStatus::Starting;
        steps[2].status = StepStatus::Complete;
        let phase = Phase::new(PhaseKind::Kill, steps);
        assert_eq!(phase.status(), StepStatus::Starting);
    }
}
