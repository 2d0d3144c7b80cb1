//! The operator-visible HTTP surface: a read-only `/plans`
//! endpoint backed by the coordinator's [`scuttle_plan::PlanManager`],
//! plus the audit event log (E3).

pub mod app;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod state;

pub use app::build_app;
pub use state::AppState;
