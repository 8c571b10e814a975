//! Booking, edit and delete eligibility for appointments.
//!
//! Every check is a pure function over already-loaded records. The store
//! backs the conflict check with a unique index on `when`; a violation there
//! is reported as [`RuleViolation::Conflict`] as well.

use std::fmt;

use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::Appointment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Edit,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::View => "see",
            Action::Edit => "edit",
            Action::Delete => "delete",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RuleViolation {
    #[error("Only the owner of the event can {0} it.")]
    NotOwner(Action),
    #[error("You can not edit past events.")]
    PastEvent,
    #[error("You can not set two events at the same time.")]
    Conflict,
}

/// Ok unless some existing appointment sits at exactly `when`.
pub fn can_book<'a, I>(existing: I, when: OffsetDateTime) -> Result<(), RuleViolation>
where
    I: IntoIterator<Item = &'a Appointment>,
{
    if existing.into_iter().any(|a| a.when == when) {
        return Err(RuleViolation::Conflict);
    }
    Ok(())
}

pub fn can_view(appointment: &Appointment, requester: Uuid) -> Result<(), RuleViolation> {
    ensure_owner(appointment, requester, Action::View)
}

/// Checks run in order: ownership, past-ness of the current `when`, then
/// collision of `when_new` with any other appointment.
pub fn can_modify<'a, I>(
    appointment: &Appointment,
    when_new: OffsetDateTime,
    requester: Uuid,
    now: OffsetDateTime,
    existing: I,
) -> Result<(), RuleViolation>
where
    I: IntoIterator<Item = &'a Appointment>,
{
    ensure_owner(appointment, requester, Action::Edit)?;
    ensure_upcoming(appointment, now)?;
    can_book(
        existing.into_iter().filter(|a| a.id != appointment.id),
        when_new,
    )
}

pub fn can_delete(
    appointment: &Appointment,
    requester: Uuid,
    now: OffsetDateTime,
) -> Result<(), RuleViolation> {
    ensure_owner(appointment, requester, Action::Delete)?;
    ensure_upcoming(appointment, now)
}

fn ensure_owner(
    appointment: &Appointment,
    requester: Uuid,
    action: Action,
) -> Result<(), RuleViolation> {
    if appointment.user_id != requester {
        return Err(RuleViolation::NotOwner(action));
    }
    Ok(())
}

fn ensure_upcoming(appointment: &Appointment, now: OffsetDateTime) -> Result<(), RuleViolation> {
    if now > appointment.when {
        return Err(RuleViolation::PastEvent);
    }
    Ok(())
}
