use rand::{rngs::OsRng, RngCore};
use serde_json::json;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use crate::{
    auth::password::Hasher,
    clock::Clock,
    config::MailConfig,
    error::{ApiError, ApiResult},
    mail::{Envelope, Mailer},
    users::{
        repo::UserRepo,
        repo_types::ResetToken,
        services::{normalize_email, validate_password},
    },
};

/// How long an issued reset token stays valid.
pub const RESET_TOKEN_TTL: Duration = Duration::days(2);
const TOKEN_BYTES: usize = 10;
pub const FORGOT_PASSWORD_TEMPLATE: &str = "emails.forgot_password";

pub fn generate_token() -> String {
    let mut buf = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut buf);
    buf.iter().map(|b| format!("{b:02x}")).collect()
}

pub(crate) fn is_expired(issued_at: OffsetDateTime, now: OffsetDateTime) -> bool {
    now - issued_at > RESET_TOKEN_TTL
}

/// Replaces any outstanding token for the user and mails a reset link.
pub async fn issue_token(
    users: &dyn UserRepo,
    mailer: &dyn Mailer,
    clock: &dyn Clock,
    sender: &MailConfig,
    email: &str,
    redirect_url: &str,
) -> ApiResult<String> {
    let email = normalize_email(email);
    let Some(mut user) = users.find_by_email(&email).await? else {
        warn!(%email, "password reset for unknown email");
        return Err(ApiError::UserNotFound);
    };

    let token = generate_token();
    user.reset_token = Some(ResetToken {
        token: token.clone(),
        issued_at: clock.now(),
    });
    let user = users.save(&user).await?;

    let data = json!({
        "email": email,
        "token": token,
        "link": format!("{redirect_url}?token={token}"),
    });
    let envelope = Envelope {
        to: user.email.clone(),
        from: sender.from_address.clone(),
        from_name: sender.from_name.clone(),
        subject: "Forgot Password".into(),
    };
    mailer.send(FORGOT_PASSWORD_TEMPLATE, data, envelope).await?;

    info!(user_id = %user.id, "password reset token issued");
    Ok(token)
}

pub async fn reset_password(
    users: &dyn UserRepo,
    hasher: &dyn Hasher,
    clock: &dyn Clock,
    token: &str,
    new_password: &str,
) -> ApiResult<()> {
    let mut user = users
        .find_by_token(token)
        .await?
        .ok_or(ApiError::TokenNotFound)?;
    let issued_at = user
        .reset_token
        .as_ref()
        .map(|t| t.issued_at)
        .ok_or(ApiError::TokenNotFound)?;

    if is_expired(issued_at, clock.now()) {
        warn!(user_id = %user.id, "expired reset token used");
        return Err(ApiError::TokenExpired);
    }
    validate_password(new_password)?;

    user.password_hash = hasher.hash(new_password)?;
    user.reset_token = None;
    users.save(&user).await?;
    info!(user_id = %user.id, "password reset");
    Ok(())
}
