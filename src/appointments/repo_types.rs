use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::PublicUser;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[serde(rename = "where")]
    pub location: String,
    #[serde(with = "time::serde::rfc3339")]
    pub when: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub user_id: Uuid,
    pub title: String,
    pub location: String,
    pub when: OffsetDateTime,
}

/// Listing row: the appointment joined with its owner.
#[derive(Debug, FromRow)]
pub struct AppointmentOwnerRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub location: String,
    pub when: OffsetDateTime,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub owner_username: String,
    pub owner_email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentWithOwner {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub user: PublicUser,
}

impl From<AppointmentOwnerRow> for AppointmentWithOwner {
    fn from(r: AppointmentOwnerRow) -> Self {
        Self {
            user: PublicUser {
                id: r.user_id,
                username: r.owner_username,
                email: r.owner_email,
            },
            appointment: Appointment {
                id: r.id,
                user_id: r.user_id,
                title: r.title,
                location: r.location,
                when: r.when,
                created_at: r.created_at,
                updated_at: r.updated_at,
            },
        }
    }
}
