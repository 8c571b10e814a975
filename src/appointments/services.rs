use time::{macros::format_description, Date};
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{CreateAppointmentRequest, ListQuery, UpdateAppointmentRequest},
    repo::{AppointmentFilter, AppointmentRepo},
    repo_types::{Appointment, AppointmentWithOwner, NewAppointment},
    rules::{self, RuleViolation},
};
use crate::{
    clock::Clock,
    db::{to_store_precision, Page, PageRequest, StoreError},
    error::{ApiError, ApiResult},
};

const MAX_TEXT_LEN: usize = 80;

fn validate_text(field: &str, value: &str) -> ApiResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ApiError::Validation(format!(
            "{field} must be at most {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(value.to_string())
}

/// A unique violation on write means another booking won the race.
fn write_error(e: StoreError) -> ApiError {
    match e {
        StoreError::Conflict => RuleViolation::Conflict.into(),
        other => other.into(),
    }
}

pub(crate) fn parse_date(raw: &str) -> ApiResult<Date> {
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map_err(|_| ApiError::Validation("date must be formatted as YYYY-MM-DD".into()))
}

async fn load(repo: &dyn AppointmentRepo, id: Uuid) -> ApiResult<Appointment> {
    repo.find_appointment(id)
        .await?
        .ok_or(ApiError::NotFound("Appointment"))
}

pub async fn list(
    repo: &dyn AppointmentRepo,
    query: ListQuery,
) -> ApiResult<Page<AppointmentWithOwner>> {
    let filter = AppointmentFilter {
        date: query.date.as_deref().map(parse_date).transpose()?,
    };
    Ok(repo
        .list_appointments(filter, PageRequest::new(query.page))
        .await?)
}

pub async fn create(
    repo: &dyn AppointmentRepo,
    owner: Uuid,
    req: CreateAppointmentRequest,
) -> ApiResult<Appointment> {
    let new = NewAppointment {
        user_id: owner,
        title: validate_text("title", &req.title)?,
        location: validate_text("where", &req.location)?,
        when: to_store_precision(req.when),
    };

    let occupant = repo.find_by_when(new.when).await?;
    if let Err(v) = rules::can_book(&occupant, new.when) {
        warn!(%owner, when = %new.when, "booking rejected: slot taken");
        return Err(v.into());
    }

    let appointment = repo.create_appointment(new).await.map_err(write_error)?;
    info!(appointment_id = %appointment.id, %owner, "appointment booked");
    Ok(appointment)
}

pub async fn show(repo: &dyn AppointmentRepo, requester: Uuid, id: Uuid) -> ApiResult<Appointment> {
    let appointment = load(repo, id).await?;
    rules::can_view(&appointment, requester)?;
    Ok(appointment)
}

pub async fn update(
    repo: &dyn AppointmentRepo,
    clock: &dyn Clock,
    requester: Uuid,
    id: Uuid,
    req: UpdateAppointmentRequest,
) -> ApiResult<Appointment> {
    let mut appointment = load(repo, id).await?;
    let when_new = req.when.map(to_store_precision).unwrap_or(appointment.when);

    let occupant = if when_new == appointment.when {
        None
    } else {
        repo.find_by_when(when_new).await?
    };
    if let Err(v) = rules::can_modify(&appointment, when_new, requester, clock.now(), &occupant) {
        warn!(appointment_id = %id, %requester, reason = %v, "update rejected");
        return Err(v.into());
    }

    if let Some(title) = req.title.as_deref() {
        appointment.title = validate_text("title", title)?;
    }
    if let Some(location) = req.location.as_deref() {
        appointment.location = validate_text("where", location)?;
    }
    appointment.when = when_new;

    let saved = repo
        .save_appointment(&appointment)
        .await
        .map_err(write_error)?;
    info!(appointment_id = %id, "appointment updated");
    Ok(saved)
}

pub async fn delete(
    repo: &dyn AppointmentRepo,
    clock: &dyn Clock,
    requester: Uuid,
    id: Uuid,
) -> ApiResult<()> {
    let appointment = load(repo, id).await?;
    if let Err(v) = rules::can_delete(&appointment, requester, clock.now()) {
        warn!(appointment_id = %id, %requester, reason = %v, "delete rejected");
        return Err(v.into());
    }
    repo.delete_appointment(id).await?;
    info!(appointment_id = %id, "appointment deleted");
    Ok(())
}
