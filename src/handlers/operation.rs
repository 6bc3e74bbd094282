use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};

use crate::error::ApiError;
use crate::models::operation::{OperationListQuery, OperationListResponse};
use crate::query::{pagination::PageRequest, ListQuery};
use crate::services::listing::{self, OPERATION_LISTING};
use crate::AppState;

pub async fn list_operations(
    State(state): State<AppState>,
    params: Result<Query<OperationListQuery>, QueryRejection>,
) -> Result<Json<OperationListResponse>, ApiError> {
    let Query(params) = params?;
    let query = ListQuery::parse(
        &OPERATION_LISTING,
        params.filter.as_deref(),
        params.order.as_deref(),
        None,
    )?;
    let request = PageRequest::from_raw(params.page.as_deref(), params.size.as_deref());

    let page = listing::list_operations(&state.db, &query, request).await?;

    Ok(Json(OperationListResponse {
        data: page.items,
        total_pages: page.total_pages,
        page: page.page,
        size: page.size,
        filter: params.filter,
        order: params.order,
    }))
}
