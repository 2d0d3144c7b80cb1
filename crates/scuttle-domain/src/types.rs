use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Tombstones ────────────────────────────────────────────────────────────────

/// Sentinel prefix that marks a reservation as already released in the
/// persisted view. No legitimate reservation ID may begin with this prefix.
pub const TOMBSTONE_PREFIX: &str = "uninstalled_";

// ── Identifiers ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReservationId(pub String);

impl ReservationId {
    pub fn new(s: impl Into<String>) -> Self {
        ReservationId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A reservation is "already released" iff its ID starts with the
    /// tombstone prefix.
    pub fn is_tombstoned(&self) -> bool {
        self.0.starts_with(TOMBSTONE_PREFIX)
    }

    /// Rewrite this ID to begin with the tombstone prefix. Idempotent:
    /// tombstoning an already-tombstoned ID returns it unchanged.
    pub fn tombstoned(&self) -> ReservationId {
        if self.is_tombstoned() {
            self.clone()
        } else {
            ReservationId(format!("{TOMBSTONE_PREFIX}{}", self.0))
        }
    }
}

impl std::fmt::Display for ReservationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskName(pub String);

impl TaskName {
    pub fn new(s: impl Into<String>) -> Self {
        TaskName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameworkId(pub String);

impl FrameworkId {
    pub fn new(s: impl Into<String>) -> Self {
        FrameworkId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FrameworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque offer identifier handed out by the master for one offer cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfferId(pub String);

impl OfferId {
    pub fn new(s: impl Into<String>) -> Self {
        OfferId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OfferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Resources ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Scalar,
    Range,
    Volume,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Scalar => write!(f, "scalar"),
            ResourceKind::Range => write!(f, "range"),
            ResourceKind::Volume => write!(f, "volume"),
        }
    }
}

/// A single reserved resource, as it appears either in a persisted task
/// record or in a live offer from the master.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub reservation_id: ReservationId,
    pub kind: ResourceKind,
    pub role: String,
    pub principal: String,
    /// Resource name, e.g. "cpus", "ports", "disk".
    pub name: String,
}

impl Resource {
    /// A resource is "already released" iff its reservation ID is tombstoned.
    pub fn is_released(&self) -> bool {
        self.reservation_id.is_tombstoned()
    }
}

// ── Task status ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatusKind {
    Staging,
    Running,
    Finished,
    Killed,
    Failed,
    Error,
    Lost,
}

impl TaskStatusKind {
    /// Any status the master will not transition further for this task
    /// instance.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatusKind::Finished
                | TaskStatusKind::Killed
                | TaskStatusKind::Failed
                | TaskStatusKind::Error
                | TaskStatusKind::Lost
        )
    }

    /// `ERROR` or a terminal `FAILED` — the two statuses that, combined
    /// with the `permanentlyFailed` label, mark a task as
    /// permanently-failed-in-error.
    pub fn is_error_or_failed_terminal(&self) -> bool {
        matches!(self, TaskStatusKind::Error)
            || (matches!(self, TaskStatusKind::Failed) && self.is_terminal())
    }
}

impl std::fmt::Display for TaskStatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatusKind::Staging => "staging",
            TaskStatusKind::Running => "running",
            TaskStatusKind::Finished => "finished",
            TaskStatusKind::Killed => "killed",
            TaskStatusKind::Failed => "failed",
            TaskStatusKind::Error => "error",
            TaskStatusKind::Lost => "lost",
        };
        write!(f, "{s}")
    }
}

/// A status update delivered by the master's status callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: String,
    pub state: TaskStatusKind,
}

// ── Task labels ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskLabels {
    #[serde(default)]
    pub permanently_failed: bool,
}

// ── TaskRecord ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub name: TaskName,
    pub task_id: String,
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub labels: TaskLabels,
    pub last_status: Option<TaskStatusKind>,
}

impl TaskRecord {
    /// A task is permanently-failed-in-error iff it is labeled
    /// `permanently_failed` and its last known status is `ERROR` or a
    /// terminal `FAILED`.
    ///
    /// Note the asymmetry preserved from the source system: a task whose
    /// last status is `ERROR` but which is *not* labeled permanently
    /// failed keeps its resources in the release plan. This may or may
    /// not have been intentional upstream; this crate preserves the
    /// observed behavior rather than "fixing" it (see DESIGN.md).
    pub fn is_permanently_failed_in_error(&self) -> bool {
        self.labels.permanently_failed
            && self
                .last_status
                .is_some_and(|s| s.is_error_or_failed_terminal())
    }

    /// Whether this task still owns at least one non-tombstoned resource.
    pub fn owns_unreleased_resource(&self) -> bool {
        self.resources.iter().any(|r| !r.is_released())
    }
}

// ── Service spec excerpt ──────────────────────────────────────────────────────
//
// The full service-specification loader is an external collaborator (out of
// scope for this crate); we only need the slice of it that decides whether
// the TLS-cleanup phase exists.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    #[serde(default)]
    pub transport_encryption: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

impl ServiceSpec {
    /// Whether any task in this service declares transport encryption — the
    /// trigger condition for the TLS-cleanup phase (together with a
    /// secrets client being configured).
    pub fn has_transport_encryption(&self) -> bool {
        self.tasks.iter().any(|t| t.transport_encryption)
    }
}

// ── Offers & operations ───────────────────────────────────────────────────────

/// One resource offer from a single offer cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub resources: Vec<Resource>,
}

/// A driver operation emitted by the resource cleaner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Operation {
    Unreserve { reservation_id: ReservationId },
    Destroy { reservation_id: ReservationId },
}

impl Operation {
    pub fn reservation_id(&self) -> &ReservationId {
        match self {
            Operation::Unreserve { reservation_id } => reservation_id,
            Operation::Destroy { reservation_id } => reservation_id,
        }
    }
}

/// Decline filters attached to a decline call. The only field this
/// coordinator ever sets is the refusal window; it is always "long" so the
/// master damps re-offering for a period large compared to the uninstall's
/// expected duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeclineFilters {
    pub refuse_seconds: f64,
}

/// The "long" decline duration: chosen so the master will not re-offer the
/// same resources for a period large compared to how long an uninstall is
/// expected to take.
pub const LONG_REFUSE_SECONDS: f64 = 3600.0 * 6.0;

impl Default for DeclineFilters {
    fn default() -> Self {
        DeclineFilters {
            refuse_seconds: LONG_REFUSE_SECONDS,
        }
    }
}

// ── Audit events ──────────────────────────────────────────────────────────────
//
// A durable home for the progress/observability signals the error-handling
// logging calls for — step completions and InvariantViolations in
// particular — parallel to the plan itself rather than only a log line.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AuditEventKind {
    StepCompleted { step: String },
    StepErrored { step: String, message: String },
    PlanComplete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    pub kind: AuditEventKind,
}

impl AuditEvent {
    pub fn new(id: Uuid, at: DateTime<Utc>, kind: AuditEventKind) -> Self {
        Self { id, at, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tombstone_round_trip() {
        let id = ReservationId::new("r1");
        assert!(!id.is_tombstoned());
        let t = id.tombstoned();
        assert!(t.is_tombstoned());
        assert_eq!(t.as_str(), "uninstalled_r1");
        // idempotent
        assert_eq!(t.tombstoned(), t);
    }

    #[test]
    fn permanently_failed_requires_label_and_status() {
        let mut t = TaskRecord {
            name: TaskName::new("b"),
            task_id: "b-1".into(),
            resources: vec![],
            labels: TaskLabels { permanently_failed: true },
            last_status: Some(TaskStatusKind::Error),
        };
        assert!(t.is_permanently_failed_in_error());

        t.labels.permanently_failed = false;
        assert!(!t.is_permanently_failed_in_error());

        t.labels.permanently_failed = true;
        t.last_status = Some(TaskStatusKind::Running);
        assert!(!t.is_permanently_failed_in_error());
    }

    #[test]
    fn error_without_permanently_failed_label_keeps_resources() {
        // The documented asymmetry: ERROR alone (no permanently_failed label)
        // does not mark the task permanently-failed-in-error.
        let t = TaskRecord {
            name: TaskName::new("c"),
            task_id: "c-1".into(),
            resources: vec![],
            labels: TaskLabels::default(),
            last_status: Some(TaskStatusKind::Error),
        };
        assert!(!t.is_permanently_failed_in_error());
    }
}
