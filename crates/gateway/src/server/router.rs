//! Axum router construction.

use axum::{routing::get, Router};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
///
/// Sealed objects are served under `route_prefix` (e.g. `/sealed`), so
/// `GET /sealed/photos/a.png` opens `<base_dir>/photos/a.png.{sealed,env}`.
///
/// The unseal route is added after the timeout layer so it is not wrapped by
/// it; the handler applies its own deadline.
pub fn build(state: AppState, route_prefix: &str) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(TimeoutLayer::new(middleware::REQUEST_TIMEOUT))
        .route(&format!("{route_prefix}/*resource"), get(handlers::unseal))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
