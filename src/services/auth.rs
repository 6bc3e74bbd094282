//! Credentials and API tokens
//!
//! Passwords are stored as Argon2id PHC strings. Each user holds at most one
//! live token; logging in again hands the same key back until it expires.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, Set,
};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::entities::{
    prelude::{Tokens, Users},
    tokens, users,
};
use crate::error::ApiError;
use crate::models::user::UserStatus;

pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 86_400;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication credentials were not provided.")]
    Missing,
    #[error("Invalid token.")]
    Invalid,
    #[error("Expired token, please refresh with /login endpoint")]
    Expired,
    #[error("User inactive or deleted.")]
    Inactive,
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Db(e) => ApiError::from(e),
            other => ApiError::unauthorized(other.to_string()),
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// False for a wrong password and for a stored hash that does not parse
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[derive(Clone)]
pub struct TokenStore {
    db: DatabaseConnection,
    lifetime: Duration,
}

impl TokenStore {
    pub fn new(db: DatabaseConnection, lifetime: Duration) -> Self {
        Self { db, lifetime }
    }

    /// Return the user's live token, or retire the stale one and mint another
    pub async fn issue(&self, user_id: i32) -> Result<tokens::Model, DbErr> {
        let now = Utc::now().fixed_offset();

        let live = Tokens::find()
            .filter(tokens::Column::UserId.eq(user_id))
            .filter(tokens::Column::Deleted.eq(false))
            .all(&self.db)
            .await?;

        let mut current = None;
        for token in live {
            if current.is_none() && token.expires_at > now {
                current = Some(token);
            } else {
                let mut stale = token.into_active_model();
                stale.deleted = Set(true);
                stale.update(&self.db).await?;
            }
        }

        if let Some(token) = current {
            debug!(user_id, "Reusing live token");
            return Ok(token);
        }

        let token = tokens::ActiveModel {
            user_id: Set(user_id),
            key: Set(Uuid::new_v4().simple().to_string()),
            created_at: Set(now),
            expires_at: Set(now + self.lifetime),
            deleted: Set(false),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        debug!(user_id, token_id = token.id, "Issued token");
        Ok(token)
    }

    /// Resolve a presented key to its active owner
    pub async fn validate(&self, key: &str) -> Result<(tokens::Model, users::Model), AuthError> {
        let (token, user) = Tokens::find()
            .filter(tokens::Column::Key.eq(key))
            .filter(tokens::Column::Deleted.eq(false))
            .find_also_related(Users)
            .one(&self.db)
            .await?
            .ok_or(AuthError::Invalid)?;

        if token.expires_at <= Utc::now().fixed_offset() {
            return Err(AuthError::Expired);
        }

        let user = user.ok_or(AuthError::Invalid)?;
        if user.status != UserStatus::Active.to_string() {
            return Err(AuthError::Inactive);
        }

        Ok((token, user))
    }

    pub async fn revoke(&self, token: tokens::Model) -> Result<(), DbErr> {
        let user_id = token.user_id;
        let mut active = token.into_active_model();
        active.deleted = Set(true);
        active.update(&self.db).await?;

        debug!(user_id, "Revoked token");
        Ok(())
    }
}

/// Check credentials, stamp `last_login` and hand out a token
pub async fn login(
    db: &DatabaseConnection,
    tokens: &TokenStore,
    username: &str,
    password: &str,
) -> Result<(users::Model, tokens::Model), ApiError> {
    let user = Users::find()
        .filter(users::Column::Username.eq(username))
        .filter(users::Column::Status.eq(UserStatus::Active.to_string()))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("The user doesn't exist"))?;

    if !verify_password(password, &user.password) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let mut active = user.into_active_model();
    active.last_login = Set(Some(Utc::now().fixed_offset()));
    let user = active.update(db).await?;

    let token = tokens.issue(user.id).await?;
    info!(user_id = user.id, "User logged in");

    Ok((user, token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_unparseable_hash_never_verifies() {
        assert!(!verify_password("plain", "plain"));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn test_auth_errors_are_unauthorized() {
        let err: ApiError = AuthError::Expired.into();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
        assert_eq!(
            err.developer_message(),
            "Expired token, please refresh with /login endpoint"
        );
    }
}
