use axum::extract::State;

use crate::extractors::Json;
use crate::models::Broadcast;
use crate::store::AppState;

/// GET /api/version - current script version and update flags
pub async fn get_version(State(state): State<AppState>) -> Json<Broadcast> {
    Json(state.licensing.broadcast())
}
