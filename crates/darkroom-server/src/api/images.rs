// ABOUTME: Image retrieval handler streaming snapshot blobs back with their content type.
// ABOUTME: This is the read path the browser hits for every thumbnail and full-size view.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

use crate::api::{parse_id, store_error_response};
use crate::app_state::SharedState;

/// GET /api/shoots/{id}/images/{snapshot_id} - Fetch a snapshot's image
/// bytes. The content type is derived from the stored blob, not guessed by
/// the client.
pub async fn get_image(
    State(state): State<SharedState>,
    Path((id, snapshot_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let (shoot_id, snapshot_id) = match (parse_id(&id), parse_id(&snapshot_id)) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };

    match state.store.get_blob(shoot_id, snapshot_id).await {
        Ok((bytes, content_type)) => {
            ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        Err(e) => store_error_response(e),
    }
}
