use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{AuthResponse, LoginRequest, RefreshRequest},
    jwt::JwtKeys,
};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    users::{repo::UserRepo, repo_types::PublicUser, services::authenticate},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(login))
        .route("/sessions/refresh", post(refresh))
}

fn issue_pair(keys: &JwtKeys, user: PublicUser) -> ApiResult<AuthResponse> {
    Ok(AuthResponse {
        access_token: keys.sign_access(user.id)?,
        refresh_token: keys.sign_refresh(user.id)?,
        user,
    })
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = authenticate(
        state.users.as_ref(),
        state.hasher.as_ref(),
        &payload.email,
        &payload.password,
    )
    .await?;

    let keys = JwtKeys::from_ref(&state);
    info!(user_id = %user.id, "user logged in");
    Ok(Json(issue_pair(&keys, PublicUser::from(&user))?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        ApiError::Unauthorized("Invalid refresh token".into())
    })?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;
    Ok(Json(issue_pair(&keys, PublicUser::from(&user))?))
}
