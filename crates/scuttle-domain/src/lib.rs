mod types;

pub use types::{
    AuditEvent, AuditEventKind, DeclineFilters, FrameworkId, Offer, OfferId, Operation,
    ReservationId, Resource, ResourceKind, ServiceSpec, TaskLabels, TaskName, TaskRecord,
    TaskSpec, TaskStatus, TaskStatusKind, LONG_REFUSE_SECONDS, TOMBSTONE_PREFIX,
};
