use axum::extract::State;
use axum::http::StatusCode;

use crate::domain::repository::BackendInspectPort;
use crate::state::AppState;

/// `GET /healthz` — process liveness.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// `GET /readyz` — readiness of the active storage backend. An unreachable
/// backend reports 503 so a supervisor holds traffic instead of routing
/// requests into 500s.
pub async fn readyz(State(state): State<AppState>) -> StatusCode {
    match state.inspector.report().await {
        Ok(report) if report.status == "connected" => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}
