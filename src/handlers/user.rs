use axum::{
    body::Bytes,
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;

use crate::error::ApiError;
use crate::handlers::auth::{AuthUser, AUTH_COOKIE};
use crate::models::user::{
    LoginRequest, LoginResponse, LogoutResponse, UserBalance, UserInfoResponse, UserSummary,
};
use crate::services::{auth, ledger::round_balance};
use crate::AppState;

fn auth_cookie(key: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; Secure; SameSite=None",
        AUTH_COOKIE, key, max_age_secs
    )
}

pub async fn login(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let payload: LoginRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid login payload: {}", e)))?;

    let (username, password) = match (payload.username, payload.password) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            (username, password)
        }
        _ => return Err(ApiError::bad_request("Username and password are required")),
    };

    let (user, token) = auth::login(&state.db, &state.tokens, &username, &password).await?;

    let remaining = token.expires_at.signed_duration_since(Utc::now()).num_milliseconds();
    let lifetime = (remaining.max(0) as f64) / 1000.0;

    let body = LoginResponse {
        developer_message: "Login successful".to_string(),
        token: token.key.clone(),
        lifetime,
        data: UserSummary {
            username: user.username,
            balance: round_balance(user.balance),
        },
    };

    Ok((
        [(SET_COOKIE, auth_cookie(&token.key, lifetime.ceil() as i64))],
        Json(body),
    )
        .into_response())
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let user_id = auth.user.id;
    state.tokens.revoke(auth.token).await?;
    tracing::info!(user_id, "User logged out");

    Ok((
        [(SET_COOKIE, auth_cookie("", 0))],
        Json(LogoutResponse {
            developer_message: "Logout successful".to_string(),
        }),
    )
        .into_response())
}

pub async fn get_user(Extension(auth): Extension<AuthUser>) -> Json<UserInfoResponse> {
    Json(UserInfoResponse {
        data: UserBalance {
            username: auth.user.username,
            user_balance: round_balance(auth.user.balance),
        },
    })
}
