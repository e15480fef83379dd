mod verify;
mod version;

pub use verify::*;
pub use version::*;

use axum::{
    Json, Router,
    routing::{get, post},
};
use serde::Serialize;

use crate::store::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/verify", post(verify_license))
        .route("/api/version", get(get_version))
}
