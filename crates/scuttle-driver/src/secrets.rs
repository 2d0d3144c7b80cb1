use async_trait::async_trait;

use crate::error::DriverError;

/// The secrets client: an opaque two-method interface used only by
/// the TLS-cleanup phase. Its own transport is out of scope here.
#[async_trait]
pub trait SecretsClient: Send + Sync + 'static {
    async fn list(&self, namespace: &str) -> Result<Vec<String>, DriverError>;

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), DriverError>;
}
