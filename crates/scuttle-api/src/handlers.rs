use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use scuttle_coordinator::UninstallReport;
use scuttle_store::Store;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// The `/plans` surface: the single uninstall plan this
/// process owns, with per-step status. There is exactly one plan per
/// scheduler process, so this reports it directly rather
/// than a collection.
pub async fn get_plans<S: Store>(State(state): State<AppState<S>>) -> Json<UninstallReport> {
    let report = UninstallReport::from_plan(&*state.plan.lock().await);
    Json(report)
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub limit: Option<usize>,
}

pub async fn list_events<S: Store>(
    State(state): State<AppState<S>>,
    Query(q): Query<EventsQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut events = state.store.list_events().await?;
    if let Some(limit) = q.limit {
        if events.len() > limit {
            events = events.split_off(events.len() - limit);
        }
    }
    Ok(Json(json!(events)))
}
