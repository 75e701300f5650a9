//! HTTP transport for a share.
//!
//! A share exposes exactly one route:
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | /{uri} | The shared file, as an attachment |
//!
//! Every other path falls through to axum's default `404`.

pub mod handlers;
pub mod state;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub use state::{ShareState, SharedState};

/// Build the router serving `state.artifact` under `/{uri}`.
///
/// `uri` must be a literal path segment (see
/// [`RouteName`](crate::session::RouteName)).
pub fn router(uri: &str, state: SharedState) -> Router {
    Router::new()
        .route(&format!("/{uri}"), get(handlers::download))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
