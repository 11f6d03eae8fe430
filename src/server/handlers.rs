use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::controller::ControllerStatus;
use crate::server::http::AppState;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub url: String,
    pub controller: ControllerStatus,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let controller = state.controller.status();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: if controller.started { "operational" } else { "starting" },
        url: state.public_url.to_string(),
        controller,
    })
}

/// Liveness probe. Reports 503 until the controller has started.
pub async fn healthz(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.controller.is_started() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "starting")
    }
}
