//! Router construction.

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{handlers, AppState};

/// Build the router. `root_path` is either empty or `/prefix`.
pub fn build_router(state: AppState, root_path: &str) -> Router {
    let routes = Router::new()
        .route("/", get(handlers::index))
        .route("/list", get(handlers::list))
        .route("/bb/:id", get(handlers::view_bblock))
        .with_state(state);

    let app = if root_path.is_empty() {
        routes
    } else {
        Router::new().nest(root_path, routes)
    };

    app.layer(
        ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        ),
    )
}
