//! Components A-D of the uninstall coordinator: resource inventory, plan
//! builder, step state machine, and plan manager. Pure data and logic —
//! no I/O, no driver or store dependency.

mod builder;
mod inventory;
mod manager;
mod phase;
mod plan;
mod step;

pub use builder::{build_plan, PlanBuildInput};
pub use inventory::ResourceInventory;
pub use manager::{CandidateRef, PlanManager, PlanStatus};
pub use phase::{Phase, PhaseKind, PhaseOrder};
pub use plan::Plan;
pub use step::{Step, StepKind, StepStatus};
