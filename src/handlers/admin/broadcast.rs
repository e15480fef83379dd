use axum::extract::State;
use serde::Serialize;

use crate::error::Result;
use crate::extractors::Json;
use crate::models::Broadcast;
use crate::store::AppState;

#[derive(Debug, Serialize)]
pub struct BroadcastUpdated {
    pub success: bool,
}

/// POST /admin/broadcast - set script version and update flags for every game
pub async fn update_broadcast(
    State(state): State<AppState>,
    Json(input): Json<Broadcast>,
) -> Result<Json<BroadcastUpdated>> {
    state.licensing.update_broadcast(&input)?;
    Ok(Json(BroadcastUpdated { success: true }))
}
