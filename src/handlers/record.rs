use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};

use crate::error::ApiError;
use crate::handlers::auth::AuthUser;
use crate::models::record::{
    DeleteRecordData, DeleteRecordQuery, DeleteRecordResponse, NewRecordData, NewRecordRequest,
    NewRecordResponse, RecordEntry, RecordListQuery, RecordListResponse,
};
use crate::query::{pagination::PageRequest, ListQuery};
use crate::services::{
    ledger,
    listing::{self, RECORD_LISTING},
    records,
};
use crate::AppState;

pub async fn create_record(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<NewRecordResponse>, ApiError> {
    let payload: NewRecordRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid record payload: {}", e)))?;
    let operation_id = payload
        .operation_id
        .ok_or_else(|| ApiError::bad_request("The operation_id field is required"))?;

    let execution = state
        .executor
        .execute(auth.user.id, operation_id, payload.variables.as_ref())
        .await?;

    Ok(Json(NewRecordResponse {
        developer_message: format!("The process {} was successful", execution.operation_type),
        data: NewRecordData {
            result: execution.result,
            variables: execution.variables,
        },
        success: true,
    }))
}

pub async fn delete_record(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    params: Result<Query<DeleteRecordQuery>, QueryRejection>,
) -> Result<Json<DeleteRecordResponse>, ApiError> {
    let Query(params) = params?;
    let record_id = records::parse_record_id(params.id.as_deref())?;
    let record: RecordEntry = records::soft_delete(&state.db, auth.user.id, record_id).await?;

    Ok(Json(DeleteRecordResponse {
        data: DeleteRecordData { result: record },
        success: true,
    }))
}

pub async fn list_records(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    params: Result<Query<RecordListQuery>, QueryRejection>,
) -> Result<Json<RecordListResponse>, ApiError> {
    let Query(params) = params?;
    let query = ListQuery::parse(
        &RECORD_LISTING,
        params.filter.as_deref(),
        params.order.as_deref(),
        params.search.as_deref(),
    )?;
    let request = PageRequest::from_raw(params.page.as_deref(), params.size.as_deref());

    let page = listing::list_records(&state.db, auth.user.id, &query, request).await?;
    let balance = ledger::current_balance(&state.db, auth.user.id).await?;

    Ok(Json(RecordListResponse {
        data: page.items,
        total_pages: page.total_pages,
        page: page.page,
        size: page.size,
        filter: params.filter,
        order: params.order,
        search: params.search,
        user_balance: ledger::round_balance(balance),
    }))
}
