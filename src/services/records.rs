use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use tracing::info;

use crate::entities::{prelude::Records, records};
use crate::error::ApiError;
use crate::models::record::RecordEntry;

/// Parse the raw `id` query parameter of DELETE /record/delete
pub fn parse_record_id(raw: Option<&str>) -> Result<i32, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("The id query parameter is required"))?;

    raw.parse::<i32>()
        .map_err(|_| ApiError::bad_request(format!("Invalid record id: {}", raw)))
}

/// Flag one of `user_id`'s records as deleted. The balance is not refunded
/// and deleting an already deleted record is a no-op.
pub async fn soft_delete(
    db: &DatabaseConnection,
    user_id: i32,
    record_id: i32,
) -> Result<RecordEntry, ApiError> {
    let (record, operation) = Records::find_by_id(record_id)
        .filter(records::Column::UserId.eq(user_id))
        .find_also_related(crate::entities::prelude::Operations)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Record {} not found", record_id)))?;

    let record = if record.deleted {
        record
    } else {
        let mut active = record.into_active_model();
        active.deleted = Set(true);
        let updated = active.update(db).await?;
        info!(user_id, record_id, "Record deleted");
        updated
    };

    Ok(RecordEntry::new(record, operation.map(|op| op.operation_type)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_id() {
        assert_eq!(parse_record_id(Some("12")).unwrap(), 12);
        assert_eq!(parse_record_id(Some(" 7 ")).unwrap(), 7);
        assert!(parse_record_id(None).is_err());
        assert!(parse_record_id(Some("")).is_err());
        assert!(parse_record_id(Some("abc")).is_err());
    }
}
