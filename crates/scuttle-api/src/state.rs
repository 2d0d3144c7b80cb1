use std::sync::Arc;

use tokio::sync::Mutex;

use scuttle_plan::PlanManager;
use scuttle_store::{ServiceStateStore, Store};

pub struct AppState<S: Store> {
    pub store: Arc<ServiceStateStore<S>>,
    pub plan: Arc<Mutex<PlanManager>>,
    pub auth_token: Arc<String>,
}

impl<S: Store> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            plan: self.plan.clone(),
            auth_token: self.auth_token.clone(),
        }
    }
}
