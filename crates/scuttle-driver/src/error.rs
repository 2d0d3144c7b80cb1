use thiserror::Error;

/// Error kinds a driver call can fail with. None of these are fatal
/// to the coordinator — the scheduler loop logs and retries next cycle.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The master rejected an accept/kill/reconcile call. The affected
    /// step stays `PREPARED`; the next offer cycle retries.
    #[error("master rejected call: {0}")]
    MasterRejected(String),

    /// The secrets client failed to list or delete. The TLS-cleanup step
    /// stays `PENDING`; retried.
    #[error("secrets client unavailable: {0}")]
    SecretsUnavailable(String),
}
