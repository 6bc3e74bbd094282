use axum::Json;

use crate::models::user::StatusResponse;

/// Liveness probe; touches nothing
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "OK".to_string(),
    })
}
