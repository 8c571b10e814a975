use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Row as stored in `users`.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub token: Option<String>,
    pub token_created_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Outstanding password reset token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetToken {
    pub token: String,
    pub issued_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub reset_token: Option<ResetToken>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        // the table CHECK keeps both columns null or both set
        let reset_token = match (r.token, r.token_created_at) {
            (Some(token), Some(issued_at)) => Some(ResetToken { token, issued_at }),
            _ => None,
        };
        Self {
            id: r.id,
            username: r.username,
            email: r.email,
            password_hash: r.password_hash,
            reset_token,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Public part of the user returned to clients.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(token: Option<&str>, at: Option<OffsetDateTime>) -> UserRow {
        let now = OffsetDateTime::now_utc();
        UserRow {
            id: Uuid::new_v4(),
            username: "ana".into(),
            email: "ana@example.com".into(),
            password_hash: "h".into(),
            token: token.map(str::to_string),
            token_created_at: at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn token_columns_map_to_single_option() {
        let now = OffsetDateTime::now_utc();
        let user = User::from(row(Some("abc"), Some(now)));
        assert_eq!(
            user.reset_token,
            Some(ResetToken { token: "abc".into(), issued_at: now })
        );
        assert!(User::from(row(None, None)).reset_token.is_none());
    }

    #[test]
    fn public_user_omits_password_hash() {
        let user = User::from(row(None, None));
        let json = serde_json::to_string(&PublicUser::from(&user)).unwrap();
        assert!(json.contains("ana@example.com"));
        assert!(!json.contains("password"));
    }
}
