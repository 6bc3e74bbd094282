//! Error taxonomy shared by every handler
//!
//! Domain failures are raised as [`ApiError`] anywhere below the handlers and
//! turned into the JSON envelope exactly once, through `IntoResponse`:
//!
//! ```json
//! {
//!   "developer_message": "User balance(0.1) is not enough to perform an operation(addition) of 0.2",
//!   "user_message": "The user doesn't have enough money in their account to perform the operation",
//!   "status": 402,
//!   "success": false
//! }
//! ```

use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::models::operation::{ArithmeticError, OperationType};
use crate::query::QueryError;
use crate::services::random_string::RandomStringError;

const UNEXPECTED_DEVELOPER_MESSAGE: &str = "Unexpected Error!";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{developer_message}")]
    NotFound { developer_message: String },

    #[error("{developer_message}")]
    BadRequest { developer_message: String },

    #[error("{developer_message}")]
    Unauthorized { developer_message: String },

    /// "OutOfMoney": the operation costs more than the caller's balance
    #[error("User balance({balance}) is not enough to perform an operation({operation_type}) of {cost}")]
    InsufficientBalance {
        balance: f64,
        cost: f64,
        operation_type: OperationType,
    },

    /// Anything not modelled as a domain failure. The detail is logged, never returned.
    #[error("{0}")]
    Unexpected(String),
}

/// JSON body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub developer_message: String,
    pub user_message: String,
    pub status: u16,
    pub success: bool,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound {
            developer_message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            developer_message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            developer_message: message.into(),
        }
    }

    pub fn unexpected(detail: impl std::fmt::Display) -> Self {
        ApiError::Unexpected(detail.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
            ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message meant for API consumers; falls back to the kind's name
    pub fn developer_message(&self) -> String {
        let message = match self {
            ApiError::Unexpected(_) => return UNEXPECTED_DEVELOPER_MESSAGE.to_string(),
            other => other.to_string(),
        };
        if message.is_empty() {
            self.kind().to_string()
        } else {
            message
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "The record that you are searching for do not exist",
            ApiError::BadRequest { .. } => "Invalid payload, please check the API doc and try again",
            ApiError::Unauthorized { .. } => {
                "The user doesn't have the credentials to access the api"
            }
            ApiError::InsufficientBalance { .. } => {
                "The user doesn't have enough money in their account to perform the operation"
            }
            ApiError::Unexpected(_) => "Some error occurred. Please try again later.",
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "NotFound",
            ApiError::BadRequest { .. } => "BadRequest",
            ApiError::Unauthorized { .. } => "Unauthorized",
            ApiError::InsufficientBalance { .. } => "OutOfMoney",
            ApiError::Unexpected(_) => "Unexpected",
        }
    }

    pub fn to_envelope(&self) -> ErrorEnvelope {
        let status = self.status_code();
        ErrorEnvelope {
            developer_message: self.developer_message(),
            user_message: self.user_message().to_string(),
            status: status.as_u16(),
            success: status == StatusCode::OK,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Unexpected(detail) => error!(error = %detail, "Unexpected error"),
            other => warn!(kind = other.kind(), error = %other, "Request failed"),
        }
        (self.status_code(), Json(self.to_envelope())).into_response()
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        ApiError::Unexpected(format!("Database error: {}", err))
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

// Arithmetic failures surface as 500
impl From<ArithmeticError> for ApiError {
    fn from(err: ArithmeticError) -> Self {
        ApiError::Unexpected(format!("Arithmetic error: {}", err))
    }
}

impl From<RandomStringError> for ApiError {
    fn from(err: RandomStringError) -> Self {
        ApiError::Unexpected(format!("Random string provider error: {}", err))
    }
}
