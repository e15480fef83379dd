//! Donation relay - license verification and activation binding
//!
//! Games verify their license key against this service; the first game to
//! present an unbound key claims it until an admin or the owner resets it.

pub mod config;
pub mod crypto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod licensing;
pub mod middleware;
pub mod models;
pub mod store;
pub mod tenants;
pub mod util;

use axum::Router;

use crate::store::AppState;

/// Full application router with every route group mounted.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(handlers::public::router())
        .merge(handlers::owner::router())
        .merge(handlers::admin::router(state.clone()))
        .with_state(state)
}
