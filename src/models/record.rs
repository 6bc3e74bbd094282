//! Record request/response models
//!
//! Models for POST /record, DELETE /record/delete and GET /records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::operation::OperationOutcome;

/// Body of POST /record
#[derive(Debug, Clone, Deserialize)]
pub struct NewRecordRequest {
    pub operation_id: Option<i32>,
    /// Normally a JSON-encoded object such as `"{\"A\": 5, \"B\": 6}"`
    #[serde(default)]
    pub variables: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecordData {
    pub result: OperationOutcome,
    /// Variables exactly as the operation consumed them
    pub variables: Map<String, Value>,
}

/// Response for POST /record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecordResponse {
    pub developer_message: String,
    pub data: NewRecordData,
    pub success: bool,
}

/// Single record in listing and delete responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEntry {
    pub id: i32,
    pub operation_id: i32,
    /// Type of the operation this record charged for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<String>,
    pub amount: f64,
    pub operation_response: String,
    pub user_balance: f64,
    /// RFC 3339 creation time
    pub created_at: String,
    pub deleted: bool,
}

impl RecordEntry {
    pub fn new(model: crate::entities::records::Model, operation_type: Option<String>) -> Self {
        Self {
            id: model.id,
            operation_id: model.operation_id,
            operation_type,
            amount: model.amount,
            operation_response: model.operation_response,
            user_balance: model.user_balance,
            created_at: model.created_at.to_rfc3339(),
            deleted: model.deleted,
        }
    }
}

/// Query parameters for GET /records
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordListQuery {
    pub page: Option<String>,
    pub size: Option<String>,
    pub filter: Option<String>,
    pub order: Option<String>,
    pub search: Option<String>,
}

/// Response for GET /records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordListResponse {
    pub data: Vec<RecordEntry>,
    pub total_pages: u64,
    pub page: u64,
    pub size: u64,
    pub filter: Option<String>,
    pub order: Option<String>,
    pub search: Option<String>,
    /// Caller's current balance
    pub user_balance: f64,
}

/// Query parameters for DELETE /record/delete
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteRecordQuery {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRecordData {
    pub result: RecordEntry,
}

/// Response for DELETE /record/delete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRecordResponse {
    pub data: DeleteRecordData,
    pub success: bool,
}
