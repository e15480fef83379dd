mod reset;

pub use reset::*;

use axum::{Router, routing::post};

use crate::store::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/owner/reset-binding", post(owner_reset_binding))
}
