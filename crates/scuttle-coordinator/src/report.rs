use serde::{Deserialize, Serialize};

use scuttle_plan::{PlanManager, PlanStatus, StepStatus};

/// One step's rendered status, for operator consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub name: String,
    pub status: StepStatus,
}

/// The uninstall plan's status, as surfaced by the `/plans` HTTP endpoint
/// and the CLI `status` command. Built fresh from the
/// [`PlanManager`] on every request — there is nothing else to cache,
/// the plan *is* the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UninstallReport {
    pub status: PlanStatus,
    pub steps: Vec<StepReport>,
}

impl UninstallReport {
    pub fn from_plan(manager: &PlanManager) -> Self {
        Self {
            status: manager.plan_status(),
            steps: manager
                .rendered_step_statuses()
                .into_iter()
                .map(|(name, status)| StepReport { name, status })
                .collect(),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.status, PlanStatus::Complete)
    }

    /// Render as an indented phase/step tree, the same way the rest of
    /// this codebase's CLI surfaces text (`output.rs`-style).
    pub fn render_text(&self) -> String {
        if self.steps.is_empty() {
            return "plan: COMPLETE (nothing to do)\n".to_string();
        }
        let mut out = format!("plan: {:?}\n", self.status);
        for step in &self.steps {
            out.push_str(&format!("  {:<8} {}\n", step.status.to_string(), step.name));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scuttle_plan::{build_plan, PlanBuildInput};

    #[test]
    fn trivial_plan_renders_as_nothing_to_do() {
        let plan = build_plan(&PlanBuildInput {
            tasks: &[],
            service_spec: None,
            secrets_client_configured: false,
            framework_id_present: false,
        });
        let manager = PlanManager::new(plan);
        let report = UninstallReport::from_plan(&manager);
        assert!(report.is_complete());
        assert!(report.render_text().contains("nothing to do"));
    }

    #[test]
    fn in_progress_plan_lists_every_step() {
        let tasks = vec![scuttle_domain::TaskRecord {
            name: scuttle_domain::TaskName::new("a"),
            task_id: "a-1".into(),
            resources: vec![scuttle_domain::Resource {
                reservation_id: scuttle_domain::ReservationId::new("r1"),
                kind: scuttle_domain::ResourceKind::Scalar,
                role: "svc-role".into(),
                principal: "svc-principal".into(),
                name: "cpus".into(),
            }],
            labels: scuttle_domain::TaskLabels::default(),
            last_status: Some(scuttle_domain::TaskStatusKind::Running),
        }];
        let plan = build_plan(&PlanBuildInput {
            tasks: &tasks,
            service_spec: None,
            secrets_client_configured: false,
            framework_id_present: true,
        });
        let manager = PlanManager::new(plan);
        let report = UninstallReport::from_plan(&manager);
        assert_eq!(report.steps.len(), 3); // kill, release, deregister
        assert!(!report.is_complete());
        let text = report.render_text();
        assert!(text.contains("kill:a"));
        assert!(text.contains("release:r1"));
        assert!(text.contains("deregister"));
    }
}
