use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::{appointments::rules::RuleViolation, db::StoreError};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Rule(#[from] RuleViolation),
    #[error("E-mail does not exist.")]
    UserNotFound,
    #[error("Reset token is not valid.")]
    TokenNotFound,
    #[error("Reset token has expired.")]
    TokenExpired,
    #[error("The old password is not valid.")]
    WrongOldPassword,
    #[error("You did not provide the new password.")]
    MissingNewPassword,
    #[error("Email already registered")]
    EmailTaken,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("An internal server error has occurred")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) | ApiError::UserNotFound => StatusCode::NOT_FOUND,
            ApiError::Rule(_)
            | ApiError::TokenNotFound
            | ApiError::TokenExpired
            | ApiError::WrongOldPassword
            | ApiError::MissingNewPassword
            | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::EmailTaken => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => {
                ApiError::Internal(anyhow::anyhow!("unexpected unique constraint violation"))
            }
            StoreError::Other(e) => ApiError::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(e) = &self {
            error!(error = ?e, "internal error");
        }
        let body = json!({ "error": { "message": self.to_string() } });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_violations_are_unauthorized() {
        for e in [
            ApiError::Rule(RuleViolation::PastEvent),
            ApiError::Rule(RuleViolation::Conflict),
            ApiError::TokenExpired,
            ApiError::TokenNotFound,
            ApiError::WrongOldPassword,
            ApiError::MissingNewPassword,
        ] {
            assert_eq!(e.status(), StatusCode::UNAUTHORIZED, "{e}");
        }
    }

    #[test]
    fn internal_error_hides_cause() {
        let e = ApiError::Internal(anyhow::anyhow!("connection refused"));
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!e.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn envelope_shape() {
        let res = ApiError::Rule(RuleViolation::Conflict).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            json["error"]["message"],
            "You can not set two events at the same time."
        );
    }
}
