//! HTTP API module
//!
//! This module exposes the light's properties and actions over HTTP, along
//! with the input decoding and response structures they use.

pub mod framework;
pub mod handlers;
pub mod inputs;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(thing_handler))
        .route("/properties", get(properties_handler))
        .route(
            "/properties/:name",
            get(property_get_handler).put(property_put_handler),
        )
        .route("/actions/timer", post(timer_action_handler))
        .route("/events", get(events_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
