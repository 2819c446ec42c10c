use crate::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/result", get(handlers::last_result))
        .route("/api/debug", get(handlers::debug_info))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any)
                .expose_headers([axum::http::HeaderName::from_static(
                    crate::sessions::SESSION_HEADER,
                )]),
        )
        .layer(TraceLayer::new_for_http())
}
