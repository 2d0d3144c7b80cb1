use serde::{Deserialize, Serialize};

use crate::phase::{Phase, PhaseKind};
use crate::step::StepStatus;

/// The uninstall plan: an ordered list of phases. Built exactly once
/// per scheduler process and thereafter mutated only by
/// step transitions — never by adding or removing phases/steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub phases: Vec<Phase>,
}

impl Plan {
    pub fn new(phases: Vec<Phase>) -> Self {
        Self { phases }
    }

    /// The trivial already-complete placeholder:
    /// nothing left to release and no framework ID persisted.
    pub fn trivial() -> Self {
        Self { phases: Vec::new() }
    }

    pub fn is_trivial(&self) -> bool {
        self.phases.is_empty()
    }

    /// Whole-plan completion: every phase complete (vacuously true for
    /// the trivial plan).
    pub fn is_complete(&self) -> bool {
        self.phases.iter().all(Phase::is_complete)
    }

    /// The earliest phase that is not yet complete — the only phase
    /// whose steps can ever be candidates (the phase-gate rule).
    pub fn active_phase(&self) -> Option<&Phase> {
        self.phases.iter().find(|p| !p.is_complete())
    }

    pub fn active_phase_mut(&mut self) -> Option<&mut Phase> {
        self.phases.iter_mut().find(|p| !p.is_complete())
    }

    pub fn phase(&self, kind: PhaseKind) -> Option<&Phase> {
        self.phases.iter().find(|p| p.kind == kind)
    }

    pub fn phase_mut(&mut self, kind: PhaseKind) -> Option<&mut Phase> {
        self.phases.iter_mut().find(|p| p.kind == kind)
    }

    /// Per-step status summary, in phase order, for rendering (CLI text
    /// output, `/plans` HTTP surface).
    pub fn step_statuses(&self) -> Vec<(String, StepStatus)> {
        self.phases
            .iter()
            .flat_map(|p| p.steps.iter().map(|s| (s.name(), s.status)))
            .collect()
    }
}
