// ABOUTME: Shoot CRUD API handlers for listing, creating, reading, updating, and deleting shoots.
// ABOUTME: All operations flow through the store actor's FIFO queue via the shared handle.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use darkroom_store::ShootPatch;
use serde::Deserialize;

use crate::api::{parse_id, store_error_response};
use crate::app_state::SharedState;

/// Request body for creating a new shoot.
#[derive(Debug, Deserialize)]
pub struct CreateShootRequest {
    pub label: String,
}

/// Request body for a partial shoot update.
#[derive(Debug, Deserialize)]
pub struct UpdateShootRequest {
    pub label: Option<String>,
}

/// GET /api/shoots - List catalog entries for all shoots.
pub async fn list_shoots(State(state): State<SharedState>) -> impl IntoResponse {
    match state.store.list_shoots().await {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => store_error_response(e),
    }
}

/// POST /api/shoots - Create a new empty shoot.
pub async fn create_shoot(
    State(state): State<SharedState>,
    Json(req): Json<CreateShootRequest>,
) -> impl IntoResponse {
    match state.store.create_shoot(req.label).await {
        Ok(shoot) => (StatusCode::CREATED, Json(shoot)).into_response(),
        Err(e) => store_error_response(e),
    }
}

/// GET /api/shoots/{id} - Fetch a full shoot document.
pub async fn get_shoot(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.store.get_shoot(id).await {
        Ok(shoot) => Json(shoot).into_response(),
        Err(e) => store_error_response(e),
    }
}

/// PATCH /api/shoots/{id} - Apply a partial update and return the document.
pub async fn update_shoot(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateShootRequest>,
) -> impl IntoResponse {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let patch = ShootPatch { label: req.label };
    match state.store.update_shoot(id, patch).await {
        Ok(shoot) => Json(shoot).into_response(),
        Err(e) => store_error_response(e),
    }
}

/// DELETE /api/shoots/{id} - Delete a shoot and everything under it.
pub async fn delete_shoot(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.store.delete_shoot(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => store_error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::AppState;
    use crate::providers::TemplatePromptBuilder;
    use crate::routes::create_router;
    use axum::body::Body;
    use http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;
    use ulid::Ulid;

    fn test_state() -> SharedState {
        let dir = tempfile::TempDir::new().unwrap();
        let store = darkroom_store::spawn(dir.keep()).unwrap();
        Arc::new(AppState::new(store, Arc::new(TemplatePromptBuilder), None))
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn create_shoot_returns_201_with_document() {
        let state = test_state();
        let app = create_router(state);

        let body = serde_json::json!({ "label": "Lookbook" });
        let resp = app
            .oneshot(
                Request::post("/api/shoots")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::CREATED);
        let json = json_body(resp).await;
        assert_eq!(json["label"], "Lookbook");
        assert!(json["id"].as_str().unwrap().parse::<Ulid>().is_ok());
        assert_eq!(json["frames"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn list_shoots_returns_created_entries() {
        let state = test_state();

        {
            let app = create_router(Arc::clone(&state));
            let body = serde_json::json!({ "label": "Listed" });
            let resp = app
                .oneshot(
                    Request::post("/api/shoots")
                        .header("content-type", "application/json")
                        .body(Body::from(serde_json::to_vec(&body).unwrap()))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let app = create_router(Arc::clone(&state));
        let resp = app
            .oneshot(Request::get("/api/shoots").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let json = json_body(resp).await;
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["label"], "Listed");
        assert_eq!(entries[0]["frameCount"], 0);
        assert_eq!(entries[0]["snapshotCount"], 0);
    }

    #[tokio::test]
    async fn get_shoot_rejects_invalid_id() {
        let state = test_state();
        let app = create_router(state);

        let resp = app
            .oneshot(
                Request::get("/api/shoots/not-a-ulid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_missing_shoot_returns_404() {
        let state = test_state();
        let app = create_router(state);

        let resp = app
            .oneshot(
                Request::get(format!("/api/shoots/{}", Ulid::new()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_shoot_changes_label() {
        let state = test_state();

        let shoot_id = {
            let app = create_router(Arc::clone(&state));
            let body = serde_json::json!({ "label": "Before" });
            let resp = app
                .oneshot(
                    Request::post("/api/shoots")
                        .header("content-type", "application/json")
                        .body(Body::from(serde_json::to_vec(&body).unwrap()))
                        .unwrap(),
                )
                .await
                .unwrap();
            json_body(resp).await["id"].as_str().unwrap().to_string()
        };

        let app = create_router(Arc::clone(&state));
        let body = serde_json::json!({ "label": "After" });
        let resp = app
            .oneshot(
                Request::patch(format!("/api/shoots/{}", shoot_id))
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let json = json_body(resp).await;
        assert_eq!(json["label"], "After");
        assert_eq!(json["id"], serde_json::json!(shoot_id));
    }

    #[tokio::test]
    async fn delete_shoot_then_get_returns_404() {
        let state = test_state();

        let shoot_id = {
            let app = create_router(Arc::clone(&state));
            let body = serde_json::json!({ "label": "Doomed" });
            let resp = app
                .oneshot(
                    Request::post("/api/shoots")
                        .header("content-type", "application/json")
                        .body(Body::from(serde_json::to_vec(&body).unwrap()))
                        .unwrap(),
                )
                .await
                .unwrap();
            json_body(resp).await["id"].as_str().unwrap().to_string()
        };

        let app = create_router(Arc::clone(&state));
        let resp = app
            .oneshot(
                Request::delete(format!("/api/shoots/{}", shoot_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let app = create_router(Arc::clone(&state));
        let resp = app
            .oneshot(
                Request::get(format!("/api/shoots/{}", shoot_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
