use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use scuttle_domain::{DeclineFilters, OfferId, Offer, Operation, TaskStatus};

use crate::driver::{Driver, DriverEvent};
use crate::error::DriverError;
use crate::secrets::SecretsClient;

/// One observed call against a [`FakeDriver`], for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Accept { offer_ids: Vec<OfferId>, operations: Vec<Operation> },
    Decline { offer_id: OfferId },
    Kill { task_id: String },
    Reconcile { task_ids: Vec<String> },
    Deregister,
}

/// In-memory [`Driver`] double. Offers and statuses are fed in via
/// [`FakeDriver::push_offers`] / [`FakeDriver::push_status`] (or produced
/// by [`crate::simulate::synthetic_offers`] in `--simulate` mode); every
/// mutating call is recorded for later inspection instead of talking to
/// a real master.
pub struct FakeDriver {
    events_tx: mpsc::UnboundedSender<DriverEvent>,
    events_rx: Mutex<mpsc::UnboundedReceiver<DriverEvent>>,
    calls: Mutex<Vec<RecordedCall>>,
    /// When true, `accept`/`kill`/`reconcile` return `MasterRejected`
    /// instead of succeeding — for exercising the retry path.
    pub reject_calls: std::sync::atomic::AtomicBool,
}

impl FakeDriver {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            events_tx,
            events_rx: Mutex::new(events_rx),
            calls: Mutex::new(Vec::new()),
            reject_calls: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn push_offers(&self, offers: Vec<Offer>) {
        let _ = self.events_tx.send(DriverEvent::Offers(offers));
    }

    pub fn push_status(&self, status: TaskStatus) {
        let _ = self.events_tx.send(DriverEvent::Status(status));
    }

    pub fn push_disconnect(&self) {
        let _ = self.events_tx.send(DriverEvent::Disconnected);
    }

    /// A cloneable sender for feeding events in from outside once this
    /// driver has been moved behind a wrapper (e.g. [`crate::UninstallRecorder`]).
    pub fn sender(&self) -> mpsc::UnboundedSender<DriverEvent> {
        self.events_tx.clone()
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Driver for FakeDriver {
    async fn next_event(&self) -> DriverEvent {
        match self.events_rx.lock().await.recv().await {
            Some(event) => event,
            None => DriverEvent::Disconnected,
        }
    }

    async fn accept(
        &self,
        offer_ids: Vec<OfferId>,
        operations: Vec<Operation>,
        _filters: DeclineFilters,
    ) -> Result<(), DriverError> {
        if self.reject_calls.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(DriverError::MasterRejected("fake rejection".into()));
        }
        self.calls.lock().await.push(RecordedCall::Accept { offer_ids, operations });
        Ok(())
    }

    async fn decline(&self, offer_id: OfferId, _filters: DeclineFilters) -> Result<(), DriverError> {
        self.calls.lock().await.push(RecordedCall::Decline { offer_id });
        Ok(())
    }

    async fn kill(&self, task_id: String) -> Result<(), DriverError> {
        if self.reject_calls.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(DriverError::MasterRejected("fake rejection".into()));
        }
        self.calls.lock().await.push(RecordedCall::Kill { task_id });
        Ok(())
    }

    async fn reconcile(&self, task_ids: Vec<String>) -> Result<(), DriverError> {
        self.calls.lock().await.push(RecordedCall::Reconcile { task_ids });
        Ok(())
    }

    async fn deregister(&self) -> Result<(), DriverError> {
        if self.reject_calls.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(DriverError::MasterRejected("fake rejection".into()));
        }
        self.calls.lock().await.push(RecordedCall::Deregister);
        Ok(())
    }
}

/// In-memory [`SecretsClient`] double, pre-seeded with namespace -> names.
#[derive(Default)]
pub struct FakeSecretsClient {
    namespaces: Mutex<std::collections::HashMap<String, Vec<String>>>,
    /// When true, `list`/`delete` return `SecretsUnavailable` instead of
    /// succeeding — for exercising the TLS-cleanup retry path.
    pub reject_calls: std::sync::atomic::AtomicBool,
}

impl FakeSecretsClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(namespace: impl Into<String>, names: Vec<String>) -> Self {
        let mut namespaces = std::collections::HashMap::new();
        namespaces.insert(namespace.into(), names);
        Self { namespaces: Mutex::new(namespaces), reject_calls: std::sync::atomic::AtomicBool::new(false) }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl SecretsClient for FakeSecretsClient {
    async fn list(&self, namespace: &str) -> Result<Vec<String>, DriverError> {
        if self.reject_calls.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(DriverError::SecretsUnavailable("fake secrets outage".into()));
        }
        Ok(self.namespaces.lock().await.get(namespace).cloned().unwrap_or_default())
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), DriverError> {
        if self.reject_calls.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(DriverError::SecretsUnavailable("fake secrets outage".into()));
        }
        if let Some(names) = self.namespaces.lock().await.get_mut(namespace) {
            names.retain(|n| n != name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn push_offers_then_next_event_delivers_them() {
        let driver = FakeDriver::new();
        driver.push_offers(vec![]);
        match driver.next_event().await {
            DriverEvent::Offers(offers) => assert!(offers.is_empty()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn push_disconnect_is_delivered_as_an_event() {
        let driver = FakeDriver::new();
        driver.push_disconnect();
        match driver.next_event().await {
            DriverEvent::Disconnected => {}
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn accept_is_recorded() {
        let driver = FakeDriver::new();
        driver
            .accept(vec![OfferId::new("o1")], vec![], DeclineFilters::default())
            .await
            .unwrap();
        assert_eq!(driver.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn reject_calls_flag_forces_master_rejected() {
        let driver = FakeDriver::new();
        driver.reject_calls.store(true, std::sync::atomic::Ordering::SeqCst);
        let result = driver.kill("t1".into()).await;
        assert!(matches!(result, Err(DriverError::MasterRejected(_))));
    }

    #[tokio::test]
    async fn secrets_client_reject_calls_flag_forces_secrets_unavailable() {
        let client = FakeSecretsClient::seeded("kafka", vec!["tls-cert".into()]);
        client.reject_calls.store(true, std::sync::atomic::Ordering::SeqCst);
        let result = client.list("kafka").await;
        assert!(matches!(result, Err(DriverError::SecretsUnavailable(_))));
    }

    #[tokio::test]
    async fn secrets_client_list_then_delete() {
        let client = FakeSecretsClient::seeded("kafka", vec!["tls-cert".into()]);
        assert_eq!(client.list("kafka").await.unwrap(), vec!["tls-cert".to_string()]);
        client.delete("kafka", "tls-cert").await.unwrap();
        assert!(client.list("kafka").await.unwrap().is_empty());
    }
}
