use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::instrument;

use super::{
    dto::{ForgotPasswordRequest, ResetPasswordRequest},
    services,
};
use crate::{error::ApiResult, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/passwords", post(forgot).put(reset))
}

#[instrument(skip(state, payload))]
pub async fn forgot(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> ApiResult<StatusCode> {
    services::issue_token(
        state.users.as_ref(),
        state.mailer.as_ref(),
        state.clock.as_ref(),
        &state.config.mail,
        &payload.email,
        &payload.redirect_url,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn reset(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> ApiResult<StatusCode> {
    services::reset_password(
        state.users.as_ref(),
        state.hasher.as_ref(),
        state.clock.as_ref(),
        &payload.token,
        &payload.password,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
