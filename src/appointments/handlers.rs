use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CreateAppointmentRequest, ListQuery, UpdateAppointmentRequest},
    repo_types::{Appointment, AppointmentWithOwner},
    services,
};
use crate::{auth::jwt::AuthUser, db::Page, error::ApiResult, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list).post(create))
        .route(
            "/appointments/:id",
            get(show).put(update).delete(destroy),
        )
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<AppointmentWithOwner>>> {
    Ok(Json(services::list(state.appointments.as_ref(), query).await?))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateAppointmentRequest>,
) -> ApiResult<(StatusCode, Json<Appointment>)> {
    let appointment = services::create(state.appointments.as_ref(), user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Appointment>> {
    Ok(Json(
        services::show(state.appointments.as_ref(), user_id, id).await?,
    ))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAppointmentRequest>,
) -> ApiResult<Json<Appointment>> {
    let appointment = services::update(
        state.appointments.as_ref(),
        state.clock.as_ref(),
        user_id,
        id,
        payload,
    )
    .await?;
    Ok(Json(appointment))
}

#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    services::delete(state.appointments.as_ref(), state.clock.as_ref(), user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
