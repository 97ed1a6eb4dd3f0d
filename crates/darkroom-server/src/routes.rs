// ABOUTME: Route definitions for the darkroom HTTP API.
// ABOUTME: Assembles all API routes into a single Axum Router with shared state and middleware.

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::SharedState;

/// Build the complete Axum router with all routes and shared state.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/shoots",
            get(api::shoots::list_shoots).post(api::shoots::create_shoot),
        )
        .route(
            "/api/shoots/{id}",
            get(api::shoots::get_shoot)
                .patch(api::shoots::update_shoot)
                .delete(api::shoots::delete_shoot),
        )
        .route("/api/shoots/{id}/frames", post(api::frames::add_frame))
        .route(
            "/api/shoots/{id}/frames/{frame_id}",
            delete(api::frames::delete_frame),
        )
        .route(
            "/api/shoots/{id}/frames/{frame_id}/snapshots",
            post(api::frames::add_snapshot),
        )
        .route(
            "/api/shoots/{id}/frames/{frame_id}/snapshots/{snapshot_id}",
            delete(api::frames::delete_snapshot),
        )
        .route(
            "/api/shoots/{id}/frames/{frame_id}/generate",
            post(api::generate::generate_snapshot),
        )
        .route(
            "/api/shoots/{id}/images/{snapshot_id}",
            get(api::images::get_image),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler. Returns 200 OK with a simple JSON body.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}
