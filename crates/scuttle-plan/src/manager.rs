use serde::{Deserialize, Serialize};

use scuttle_domain::{ReservationId, TaskName};

use crate::plan::Plan;
use crate::step::{Step, StepKind, StepStatus};

/// A candidate step ready for work this tick: its phase and index within
/// that phase, so the coordinator (component G) can mutate it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateRef {
    pub phase_index: usize,
    pub step_index: usize,
}

/// Coarse plan status for operator consumption (the `/plans` HTTP surface,
/// the CLI `status` command).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanStatus {
    Complete,
    InProgress,
}

/// Component D: the single plan manager. Wraps a [`Plan`] and exposes the
/// two operations the offer loop needs: `candidates()` (what to start
/// this tick) and `plan_status()` (for reporting). No multi-plan
/// arbitration — one process, one plan.
pub struct PlanManager {
    plan: Plan,
}

impl PlanManager {
    pub fn new(plan: Plan) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn plan_mut(&mut self) -> &mut Plan {
        &mut self.plan
    }

    /// Union of eligible `PENDING`/`PREPARED` steps from the active
    /// phase(s). The active phase is the earliest non-complete
    /// one; for the parallel release/TLS phases that's the only phase
    /// that can ever have candidates at a given moment, since the phase
    /// gate blocks every later phase until it's complete.
    pub fn candidates(&self) -> Vec<CandidateRef> {
        let Some(phase_index) = self.plan.phases.iter().position(|p| !p.is_complete()) else {
            return Vec::new();
        };
        let phase = &self.plan.phases[phase_index];
        phase
            .candidate_indices()
            .into_iter()
            .map(|step_index| CandidateRef { phase_index, step_index })
            .collect()
    }

    pub fn step_at(&self, candidate: CandidateRef) -> &Step {
        &self.plan.phases[candidate.phase_index].steps[candidate.step_index]
    }

    pub fn step_at_mut(&mut self, candidate: CandidateRef) -> &mut Step {
        &mut self.plan.phases[candidate.phase_index].steps[candidate.step_index]
    }

    /// Return every `Error` step to `Pending` so it re-enters the
    /// candidate pool. Run once per tick before `candidates()` — a
    /// `Strict` phase's lone candidate slot is occupied by whatever step
    /// is first non-complete, so a failed step left in `Error` would
    /// otherwise wedge the phase (and everything gated behind it) forever.
    pub fn retry_errored_steps(&mut self) {
        for phase in &mut self.plan.phases {
            for step in &mut phase.steps {
                step.retry();
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.plan.is_complete()
    }

    pub fn plan_status(&self) -> PlanStatus {
        if self.plan.is_complete() {
            PlanStatus::Complete
        } else {
            PlanStatus::InProgress
        }
    }

    /// Find a step anywhere in the plan matching `predicate`, regardless of
    /// phase-gating. Used by the recorder and the coordinator's terminal
    /// single-step phases (TLS cleanup, deregister) to confirm progress
    /// that was observed out of band from `candidates()`.
    pub fn step_mut(&mut self, predicate: impl Fn(&StepKind) -> bool) -> Option<&mut Step> {
        self.plan
            .phases
            .iter_mut()
            .flat_map(|p| p.steps.iter_mut())
            .find(|s| predicate(&s.kind))
    }

    /// Mark the kill step for `task_name` complete (component F / the
    /// status callback path: becomes COMPLETE upon receiving any
    /// terminal task status"). Returns `false` if no such step exists
    /// (the task wasn't in the plan's kill targets).
    pub fn complete_kill_step(&mut self, task_name: &TaskName) -> bool {
        match self.step_mut(|k| matches!(k, StepKind::Kill { task_name: t } if t == task_name)) {
            Some(step) => {
                step.start();
                step.confirm();
                true
            }
            None => false,
        }
    }

    /// Mark the release step for `reservation_id` complete (component F:
    /// the recorder observed an accepted operation against it). Returns
    /// `false` if no such step exists in the plan (InvariantViolation,
    /// logged by the caller, not fatal here).
    pub fn complete_release_step(&mut self, reservation_id: &ReservationId) -> bool {
        match self.step_mut(
            |k| matches!(k, StepKind::Release { reservation_id: r } if r == reservation_id),
        ) {
            Some(step) => {
                step.start();
                step.confirm();
                true
            }
            None => false,
        }
    }

    /// Every step's rendered status, honoring the phase-gate: steps in a
    /// phase that isn't active yet are reported `WAITING` rather than
    /// their literal (always `Pending`) stored status — the projection
    /// derived rather than stored.
    pub fn rendered_step_statuses(&self) -> Vec<(String, StepStatus)> {
        let active = self.plan.phases.iter().position(|p| !p.is_complete());
        self.plan
            .phases
            .iter()
            .enumerate()
            .flat_map(|(i, phase)| {
                phase.steps.iter().map(move |step| {
                    let status = if phase.is_complete() {
                        StepStatus::Complete
                    } else if Some(i) == active {
                        step.status
                    } else {
                        StepStatus::Waiting
                    };
                    (step.name(), status)
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::{Phase, PhaseKind};
    use crate::step::{Step, StepKind};
    use scuttle_domain::{ReservationId, TaskName};

    fn sample_plan() -> Plan {
        Plan::new(vec![
            Phase::new(
                PhaseKind::Kill,
                vec![Step::new(StepKind::Kill { task_name: TaskName::new("a") })],
            ),
            Phase::new(
                PhaseKind::Release,
                vec![
                    Step::new(StepKind::Release { reservation_id: ReservationId::new("r1") }),
                    Step::new(StepKind::Release { reservation_id: ReservationId::new("r2") }),
                ],
            ),
            Phase::new(PhaseKind::Deregister, vec![Step::new(StepKind::Deregister)]),
        ])
    }

    #[test]
    fn candidates_only_surface_from_the_active_phase() {
        let manager = PlanManager::new(sample_plan());
        let candidates = manager.candidates();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].phase_index, 0);
    }

    #[test]
    fn release_steps_never_surface_as_candidates_before_kill_completes() {
        let manager = PlanManager::new(sample_plan());
        let candidates = manager.candidates();
        // kill phase still pending -> release steps (phase index 1) must
        // not appear among this tick's candidates, regardless of their
        // own per-step status.
        assert!(candidates.iter().all(|c| c.phase_index != 1));
    }

    #[test]
    fn retry_errored_steps_reopens_a_strict_phase_stuck_in_error() {
        let mut plan = sample_plan();
        plan.phases[0].steps[0].status = StepStatus::Error;
        let mut manager = PlanManager::new(plan);
        assert!(manager.candidates().is_empty(), "an errored step in a Strict phase yields no candidate");

        manager.retry_errored_steps();
        let candidates = manager.candidates();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].phase_index, 0);
        assert_eq!(manager.plan().phases[0].steps[0].status, StepStatus::Pending);
    }

    #[test]
    fn deregister_not_a_candidate_until_earlier_phases_complete() {
        let mut plan = sample_plan();
        plan.phases[0].steps[0].status = StepStatus::Complete;
        // release phase still pending
        let manager = PlanManager::new(plan);
        let candidates = manager.candidates();
        assert!(candidates.iter().all(|c| c.phase_index == 1));
    }

    #[test]
    fn deregister_becomes_candidate_once_all_else_complete() {
        let mut plan = sample_plan();
        plan.phases[0].steps[0].status = StepStatus::Complete;
        plan.phases[1].steps[0].status = StepStatus::Complete;
        plan.phases[1].steps[1].status = StepStatus::Complete;
        let manager = PlanManager::new(plan);
        let candidates = manager.candidates();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].phase_index, 2);
    }

    #[test]
    fn unstarted_phases_render_as_waiting() {
        let manager = PlanManager::new(sample_plan());
        let rendered = manager.rendered_step_statuses();
        // kill phase is active -> Pending; release and deregister -> Waiting
        assert_eq!(rendered[0].1, StepStatus::Pending);
        assert_eq!(rendered[1].1, StepStatus::Waiting);
        assert_eq!(rendered[3].1, StepStatus::Waiting);
    }

    #[test]
    fn complete_release_step_marks_the_matching_step_only() {
        let mut manager = PlanManager::new(sample_plan());
        assert!(manager.complete_release_step(&ReservationId::new("r1")));
        let release = &manager.plan().phases[1];
        assert!(release.steps[0].is_complete());
        assert!(!release.steps[1].is_complete());
    }

    #[test]
    fn complete_release_step_unknown_reservation_returns_false() {
        let mut manager = PlanManager::new(sample_plan());
        assert!(!manager.complete_release_step(&ReservationId::new("ghost")));
    }

    #[test]
    fn complete_kill_step_marks_matching_task() {
        let mut manager = PlanManager::new(sample_plan());
        assert!(manager.complete_kill_step(&TaskName::new("a")));
        assert!(manager.plan().phases[0].steps[0].is_complete());
    }

    #[test]
    fn plan_status_reflects_completion() {
        let mut plan = sample_plan();
        let manager = PlanManager::new(plan.clone());
        assert_eq!(manager.plan_status(), PlanStatus::InProgress);

        for phase in &mut plan.phases {
            for step in &mut phase.steps {
                step.status = StepStatus::Complete;
            }
        }
        let manager = PlanManager::new(plan);
        assert_eq!(manager.plan_status(), PlanStatus::Complete);
    }
}
