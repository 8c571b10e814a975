use anyhow::Context;
use serde::Serialize;
use sqlx::{postgres::PgPoolOptions, PgPool};
use time::{Duration, OffsetDateTime};

pub const PER_PAGE: i64 = 20;
/// Highest page number honoured; larger requests land on an empty page.
pub const MAX_PAGE: i64 = 1_000_000;

/// Error surfaced by record store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("unique constraint violated")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Conflict,
            _ => StoreError::Other(anyhow::Error::new(e)),
        }
    }
}

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")
}

/// Drops the sub-microsecond part, which `TIMESTAMPTZ` cannot hold.
pub fn to_store_precision(t: OffsetDateTime) -> OffsetDateTime {
    t - Duration::nanoseconds(i64::from(t.nanosecond() % 1_000))
}

/// 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            per_page: PER_PAGE,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total: i64,
    pub per_page: i64,
    pub page: i64,
    pub last_page: i64,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(req: PageRequest, total: i64, data: Vec<T>) -> Self {
        let last_page = ((total + req.per_page - 1) / req.per_page).max(1);
        Self {
            total,
            per_page: req.per_page,
            page: req.page,
            last_page,
            data,
        }
    }
}
