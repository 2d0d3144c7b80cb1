use scuttle_domain::{ServiceSpec, TaskRecord};

use crate::inventory::ResourceInventory;
use crate::phase::{Phase, PhaseKind};
use crate::plan::Plan;
use crate::step::{Step, StepKind};

/// Everything the builder needs beyond the persisted task set — the
/// inputs that decide whether the TLS-cleanup phase exists
/// and whether a framework ID is already on file.
pub struct PlanBuildInput<'a> {
    pub tasks: &'a [TaskRecord],
    pub service_spec: Option<&'a ServiceSpec>,
    pub secrets_client_configured: bool,
    pub framework_id_present: bool,
}

/// Construct the ordered plan: kill -> release -> TLS cleanup ->
/// deregister. Called exactly once per scheduler process.
pub fn build_plan(input: &PlanBuildInput<'_>) -> Plan {
    let inventory = ResourceInventory::from_tasks(input.tasks);

    if inventory.is_empty() && !input.framework_id_present {
        return Plan::trivial();
    }

    let mut phases = Vec::new();

    let kill_steps: Vec<Step> = inventory
        .kill_targets
        .iter()
        .map(|name| Step::new(StepKind::Kill { task_name: name.clone() }))
        .collect();
    phases.push(Phase::new(PhaseKind::Kill, kill_steps));

    let release_steps: Vec<Step> = inventory
        .release_targets
        .iter()
        .map(|id| Step::new(StepKind::Release { reservation_id: id.clone() }))
        .collect();
    phases.push(Phase::new(PhaseKind::Release, release_steps));

    let tls_enabled = input.secrets_client_configured
        && input
            .service_spec
            .is_some_and(ServiceSpec::has_transport_encryption);
    if tls_enabled {
        let namespace = input
            .service_spec
            .map(|spec| spec.name.clone())
            .unwrap_or_default();
        phases.push(Phase::new(
            PhaseKind::TlsCleanup,
            vec![Step::new(StepKind::TlsCleanup { namespace })],
        ));
    }

    phases.push(Phase::new(PhaseKind::Deregister, vec![Step::new(StepKind::Deregister)]));

    Plan::new(phases)
}
