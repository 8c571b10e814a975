use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
    /// Front-end page the emailed link points to; the token is appended as `?token=`.
    pub redirect_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}
