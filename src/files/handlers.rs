use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    repo::FileRecord,
    services::{self, Upload, MAX_UPLOAD_BYTES},
};
use crate::{
    auth::jwt::AuthUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/files",
            // headroom for the multipart framing around the 2mb file
            post(upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024)),
        )
        .route("/files/:id", get(show))
}

/// POST /files (multipart, field `file`)
#[instrument(skip(state, mp))]
pub async fn upload(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    mut mp: Multipart,
) -> ApiResult<(StatusCode, Json<FileRecord>)> {
    let mut file = None;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let client_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;
        file = Some(Upload {
            body,
            client_name,
            content_type,
        });
        break;
    }
    let file = file.ok_or_else(|| ApiError::Validation("file is required".into()))?;

    let record = services::upload(state.files.as_ref(), state.storage.as_ref(), file).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Temporary redirect to a presigned URL of the stored object.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Redirect> {
    let url = services::presign(state.files.as_ref(), state.storage.as_ref(), id).await?;
    Ok(Redirect::temporary(&url))
}
