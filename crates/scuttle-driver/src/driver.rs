use async_trait::async_trait;

use scuttle_domain::{DeclineFilters, Offer, OfferId, Operation, TaskStatus};

use crate::error::DriverError;

/// One delivery from the offer-protocol transport: a batch of offers, a
/// task status update, or a disconnect notice (the "offer callback"
/// "status callback"). Modeled as a pull-based stream rather than literal
/// callbacks — the natural async-Rust shape for what the source system
/// expresses as inbound callbacks on a single-threaded scheduler driver.
#[derive(Debug, Clone)]
pub enum DriverEvent {
    Offers(Vec<Offer>),
    Status(TaskStatus),
    Disconnected,
}

/// The offer-protocol driver (out of scope to implement for real —
/// this crate only defines the interface and test doubles). Every
/// mutating call is a blocking RPC to the master;
/// none of them may be invoked while holding the plan lock.
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    /// Block until the next event is available.
    async fn next_event(&self) -> DriverEvent;

    /// Accept a batch of offers with the given operations, using the
    /// supplied decline filters for anything not consumed by them.
    async fn accept(
        &self,
        offer_ids: Vec<OfferId>,
        operations: Vec<Operation>,
        filters: DeclineFilters,
    ) -> Result<(), DriverError>;

    /// Decline a single offer outright (always with the
    /// long refusal window).
    async fn decline(&self, offer_id: OfferId, filters: DeclineFilters) -> Result<(), DriverError>;

    async fn kill(&self, task_id: String) -> Result<(), DriverError>;

    async fn reconcile(&self, task_ids: Vec<String>) -> Result<(), DriverError>;

    async fn deregister(&self) -> Result<(), DriverError>;
}
