mod broadcast;
mod licenses;

pub use broadcast::*;
pub use licenses::*;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::require_admin;
use crate::store::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/licenses", get(list_licenses).post(issue_license))
        .route("/admin/licenses/toggle", post(toggle_license))
        .route("/admin/licenses/delete", post(delete_license))
        .route("/admin/licenses/reset", post(reset_license_binding))
        .route("/admin/broadcast", post(update_broadcast))
        .layer(middleware::from_fn_with_state(state, require_admin))
}
