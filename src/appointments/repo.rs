use async_trait::async_trait;
use sqlx::PgPool;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::repo_types::{Appointment, AppointmentOwnerRow, AppointmentWithOwner, NewAppointment};
use crate::db::{Page, PageRequest, StoreError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    /// UTC calendar day the appointment falls on.
    pub date: Option<Date>,
}

#[async_trait]
pub trait AppointmentRepo: Send + Sync {
    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;
    async fn find_by_when(&self, when: OffsetDateTime) -> Result<Option<Appointment>, StoreError>;
    /// Fails with [`StoreError::Conflict`] when `when` is already taken.
    async fn create_appointment(&self, new: NewAppointment) -> Result<Appointment, StoreError>;
    /// Fails with [`StoreError::Conflict`] when `when` is already taken.
    async fn save_appointment(&self, appointment: &Appointment) -> Result<Appointment, StoreError>;
    async fn delete_appointment(&self, id: Uuid) -> Result<(), StoreError>;
    async fn list_appointments(
        &self,
        filter: AppointmentFilter,
        page: PageRequest,
    ) -> Result<Page<AppointmentWithOwner>, StoreError>;
}

#[derive(Clone)]
pub struct PgAppointmentRepo {
    db: PgPool,
}

impl PgAppointmentRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AppointmentRepo for PgAppointmentRepo {
    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let row = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT id, user_id, title, location, "when", created_at, updated_at
              FROM appointments
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_by_when(&self, when: OffsetDateTime) -> Result<Option<Appointment>, StoreError> {
        let row = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT id, user_id, title, location, "when", created_at, updated_at
              FROM appointments
             WHERE "when" = $1
            "#,
        )
        .bind(when)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn create_appointment(&self, new: NewAppointment) -> Result<Appointment, StoreError> {
        let row = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (user_id, title, location, "when")
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, location, "when", created_at, updated_at
            "#,
        )
        .bind(new.user_id)
        .bind(&new.title)
        .bind(&new.location)
        .bind(new.when)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn save_appointment(&self, a: &Appointment) -> Result<Appointment, StoreError> {
        let row = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
               SET title = $2, location = $3, "when" = $4, updated_at = now()
             WHERE id = $1
            RETURNING id, user_id, title, location, "when", created_at, updated_at
            "#,
        )
        .bind(a.id)
        .bind(&a.title)
        .bind(&a.location)
        .bind(a.when)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn list_appointments(
        &self,
        filter: AppointmentFilter,
        page: PageRequest,
    ) -> Result<Page<AppointmentWithOwner>, StoreError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
              FROM appointments a
             WHERE ($1::date IS NULL OR (a."when" AT TIME ZONE 'UTC')::date = $1)
            "#,
        )
        .bind(filter.date)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, AppointmentOwnerRow>(
            r#"
            SELECT a.id, a.user_id, a.title, a.location, a."when", a.created_at, a.updated_at,
                   u.username AS owner_username, u.email AS owner_email
              FROM appointments a
              JOIN users u ON u.id = a.user_id
             WHERE ($1::date IS NULL OR (a."when" AT TIME ZONE 'UTC')::date = $1)
             ORDER BY a."when" ASC
             LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filter.date)
        .bind(page.per_page)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(Page::new(
            page,
            total,
            rows.into_iter().map(AppointmentWithOwner::from).collect(),
        ))
    }
}
