use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::info;

use crate::entities::{prelude::Users, users};
use crate::error::ApiError;
use crate::models::user::UserStatus;
use crate::services::auth::hash_password;
use crate::services::ledger::{round_balance, BASE_USER_BALANCE};

/// Usernames are email addresses: one `@`, non-empty local part, dotted domain
pub fn is_valid_username(username: &str) -> bool {
    let Some((local, domain)) = username.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !username.chars().any(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

pub async fn create_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    balance: Option<f64>,
) -> Result<users::Model, ApiError> {
    let username = username.trim();
    if !is_valid_username(username) {
        return Err(ApiError::bad_request(format!(
            "Username {} is not a valid email address",
            username
        )));
    }
    if password.is_empty() {
        return Err(ApiError::bad_request("Password must not be empty"));
    }

    let balance = balance.unwrap_or(BASE_USER_BALANCE);
    if !balance.is_finite() || balance < 0.0 {
        return Err(ApiError::bad_request(format!(
            "Balance must be a non-negative number, got {}",
            balance
        )));
    }

    let existing = Users::find()
        .filter(users::Column::Username.eq(username))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::bad_request(format!(
            "User {} already exists",
            username
        )));
    }

    let password = hash_password(password).map_err(ApiError::unexpected)?;
    let user = users::ActiveModel {
        username: Set(username.to_string()),
        password: Set(password),
        status: Set(UserStatus::Active.to_string()),
        balance: Set(round_balance(balance)),
        last_login: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(user_id = user.id, username = %user.username, balance = user.balance, "Created user");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_must_be_email_shaped() {
        assert!(is_valid_username("admin@example.com"));
        assert!(is_valid_username("a.b+c@mail.example.org"));
        assert!(!is_valid_username("admin"));
        assert!(!is_valid_username("@example.com"));
        assert!(!is_valid_username("admin@localhost"));
        assert!(!is_valid_username("admin@@example.com"));
        assert!(!is_valid_username("admin@example..com"));
        assert!(!is_valid_username("ad min@example.com"));
    }
}
