use std::sync::Arc;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use scuttle_plan::PlanManager;
use scuttle_store::{ServiceStateStore, Store};

use crate::auth::require_bearer_token;
use crate::handlers;
use crate::state::AppState;

/// The operator-visible HTTP surface: `/plans` backed by the same
/// [`PlanManager`] the coordinator mutates, plus the audit event log
/// (E3) queryable through the store.
pub fn build_app<S: Store>(
    store: Arc<ServiceStateStore<S>>,
    plan: Arc<Mutex<PlanManager>>,
    auth_token: Arc<String>,
) -> Router {
    let state = AppState { store, plan, auth_token };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/plans", get(handlers::get_plans::<S>))
        .route("/events", get(handlers::list_events::<S>))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer_token::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use scuttle_plan::{build_plan, PlanBuildInput};
    use scuttle_store::InMemoryStore;
    use tower::util::ServiceExt;

    const TEST_TOKEN: &str = "test-token";

    fn test_app() -> Router {
        let store = ServiceStateStore::shared(InMemoryStore::new());
        let plan = build_plan(&PlanBuildInput {
            tasks: &[],
            service_spec: None,
            secrets_client_configured: false,
            framework_id_present: false,
        });
        let plan = Arc::new(Mutex::new(PlanManager::new(plan)));
        build_app(store, plan, Arc::new(TEST_TOKEN.to_string()))
    }

    fn authed(req: axum::http::request::Builder) -> axum::http::request::Builder {
        req.header("Authorization", format!("Bearer {}", TEST_TOKEN))
    }

    #[tokio::test]
    async fn unauthenticated_request_returns_401() {
        let app = test_app();
        let resp = app
            .oneshot(Request::builder().uri("/plans").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_token_returns_401() {
        let app = test_app();
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/plans")
                    .header("Authorization", "Bearer wrong-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_returns_200() {
        let app = test_app();
        let resp = app
            .oneshot(authed(Request::builder().uri("/health")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn plans_reports_the_trivial_complete_plan() {
        let app = test_app();
        let resp = app
            .oneshot(authed(Request::builder().uri("/plans")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let report: scuttle_coordinator::UninstallReport = serde_json::from_slice(&body).unwrap();
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn events_empty_list() {
        let app = test_app();
        let resp = app
            .oneshot(authed(Request::builder().uri("/events")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
