//! Router assembly.

use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::panic_response;
use crate::routes;
use crate::state::AppState;

/// The full application: REST under `/api/v1`, `/health` and the `/ws`
/// real-time channel.
pub fn build_router(state: AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with the dashboard's origin once it is deployed.
    Router::new()
        .merge(routes::health::router())
        .merge(pos_realtime::ws_server::routes())
        .nest("/api/v1/orders", routes::orders::router())
        .nest("/api/v1/payment", routes::payment::router())
        .nest("/api/v1/dashboard", routes::dashboard::router())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
