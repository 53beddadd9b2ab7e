use axum::{
    extract::State,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, middleware, pipeline, queue, videos};
use crate::metrics;
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Read-only routes
    let read_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/config", get(handlers::get_config))
        .route("/queue", get(queue::list_queue))
        .route("/videos", get(videos::list_videos));

    // Mutating routes sit behind the configured authenticator
    let write_routes = Router::new()
        .route("/curate", post(pipeline::curate))
        .route("/produce", post(pipeline::produce))
        .route("/videos/{name}", delete(videos::delete_video))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let api_routes = read_routes.merge(write_routes);

    Router::new()
        .nest("/api", api_routes)
        .route("/metrics", get(metrics_handler))
        .layer(axum_middleware::from_fn(middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    metrics::collect_dynamic_metrics(&state);
    metrics::encode_metrics()
}
