use serde::Deserialize;
use time::OffsetDateTime;

#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    #[serde(alias = "name")]
    pub title: String,
    #[serde(rename = "where", alias = "location")]
    pub location: String,
    #[serde(with = "time::serde::rfc3339")]
    pub when: OffsetDateTime,
}

/// Fields left out keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAppointmentRequest {
    #[serde(default, alias = "name")]
    pub title: Option<String>,
    #[serde(default, rename = "where", alias = "location")]
    pub location: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub when: Option<OffsetDateTime>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
}
