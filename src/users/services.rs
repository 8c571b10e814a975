use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{RegisterRequest, UpdateUserRequest},
    repo::UserRepo,
    repo_types::{NewUser, User},
};
use crate::{
    auth::password::{Hasher, MIN_PASSWORD_LEN},
    db::StoreError,
    error::{ApiError, ApiResult},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn validate_password(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation("Password too short".into()));
    }
    Ok(())
}

fn validate_username(username: &str) -> ApiResult<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ApiError::Validation("Username is required".into()));
    }
    Ok(username.to_string())
}

pub async fn register(
    users: &dyn UserRepo,
    hasher: &dyn Hasher,
    req: RegisterRequest,
) -> ApiResult<User> {
    let email = normalize_email(&req.email);
    if !is_valid_email(&email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }
    validate_password(&req.password)?;
    let username = validate_username(&req.username)?;

    if users.find_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(ApiError::EmailTaken);
    }

    let new = NewUser {
        username,
        email,
        password_hash: hasher.hash(&req.password)?,
    };
    let user = users.create(new).await.map_err(|e| match e {
        StoreError::Conflict => ApiError::EmailTaken,
        other => other.into(),
    })?;
    info!(user_id = %user.id, "user registered");
    Ok(user)
}

/// Checks email + password. Unknown email and wrong password are
/// indistinguishable to the caller.
pub async fn authenticate(
    users: &dyn UserRepo,
    hasher: &dyn Hasher,
    email: &str,
    password: &str,
) -> ApiResult<User> {
    let invalid = || ApiError::Unauthorized("Invalid credentials".into());
    let email = normalize_email(email);
    let Some(user) = users.find_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(invalid());
    };
    if !hasher.verify(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(invalid());
    }
    Ok(user)
}

/// Returns the new password hash, or `None` when the password stays as is.
///
/// Without `old` nothing changes, whatever `new` holds.
pub fn change_password(
    hasher: &dyn Hasher,
    current_hash: &str,
    old: Option<&str>,
    new: Option<&str>,
) -> ApiResult<Option<String>> {
    let Some(old) = old.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if !hasher.verify(old, current_hash)? {
        return Err(ApiError::WrongOldPassword);
    }
    let new = new
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::MissingNewPassword)?;
    validate_password(new)?;
    Ok(Some(hasher.hash(new)?))
}

pub async fn update_profile(
    users: &dyn UserRepo,
    hasher: &dyn Hasher,
    user_id: Uuid,
    req: UpdateUserRequest,
) -> ApiResult<User> {
    let mut user = users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    if let Some(hash) = change_password(
        hasher,
        &user.password_hash,
        req.password_old.as_deref(),
        req.password.as_deref(),
    )? {
        user.password_hash = hash;
        info!(user_id = %user.id, "password changed");
    }
    if let Some(username) = req.username.as_deref() {
        user.username = validate_username(username)?;
    }

    Ok(users.save(&user).await?)
}
