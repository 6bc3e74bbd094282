//! List endpoints over the operations catalog and the caller's records

use sea_orm::{
    sea_query::{Expr, SimpleExpr},
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QuerySelect,
    RelationTrait, Select,
};
use std::collections::HashMap;

use crate::entities::{operations, prelude::Operations, records, users};
use crate::error::ApiError;
use crate::models::operation::OperationEntry;
use crate::models::record::RecordEntry;
use crate::query::pagination::{paginate_select, Page, PageRequest};
use crate::query::sea::{FieldKind, Listable, ResolvedField, SeaQuery};
use crate::query::{AllowList, ListQuery};

pub const OPERATION_LISTING: AllowList = AllowList {
    filter: &["type", "cost", "cost__gt", "cost__gte", "cost__lt", "cost__lte"],
    order: &["id", "type", "cost"],
    search: &[],
};

pub const RECORD_LISTING: AllowList = AllowList {
    filter: &[
        "operation__type",
        "deleted",
        "amount",
        "amount__gt",
        "amount__lt",
        "user_balance__gt",
        "user_balance__lt",
        "operation_response",
        "operation_response__contains",
    ],
    order: &["id", "created_at", "amount", "user_balance", "operation__type"],
    search: &["operation__type", "operation_response", "user__username"],
};

impl Listable for operations::Entity {
    fn resolve_field(path: &str) -> Option<ResolvedField> {
        use operations::Column;

        let (column, kind) = match path {
            "id" => (Column::Id, FieldKind::Integer),
            "type" => (Column::OperationType, FieldKind::Text),
            "cost" => (Column::Cost, FieldKind::Float),
            _ => return None,
        };
        Some(ResolvedField::column(operations::Entity, column, kind))
    }
}

impl Listable for records::Entity {
    fn listing_select() -> Select<Self> {
        records::Entity::find()
            .join(JoinType::InnerJoin, records::Relation::Operations.def())
            .join(JoinType::InnerJoin, records::Relation::Users.def())
    }

    fn resolve_field(path: &str) -> Option<ResolvedField> {
        use records::Column;

        let field = match path {
            "id" => ResolvedField::column(records::Entity, Column::Id, FieldKind::Integer),
            "amount" => ResolvedField::column(records::Entity, Column::Amount, FieldKind::Float),
            "user_balance" => {
                ResolvedField::column(records::Entity, Column::UserBalance, FieldKind::Float)
            }
            "operation_response" => {
                ResolvedField::column(records::Entity, Column::OperationResponse, FieldKind::Text)
            }
            "deleted" => ResolvedField::column(records::Entity, Column::Deleted, FieldKind::Boolean),
            "created_at" => {
                ResolvedField::column(records::Entity, Column::CreatedAt, FieldKind::Text)
            }
            "operation__type" => ResolvedField::column(
                operations::Entity,
                operations::Column::OperationType,
                FieldKind::Text,
            ),
            "user__username" => {
                ResolvedField::column(users::Entity, users::Column::Username, FieldKind::Text)
            }
            _ => return None,
        };
        Some(field)
    }

    fn creation_column() -> Option<SimpleExpr> {
        Some(Expr::col((records::Entity, records::Column::CreatedAt)).into())
    }
}

pub async fn list_operations(
    db: &DatabaseConnection,
    query: &ListQuery,
    page: PageRequest,
) -> Result<Page<OperationEntry>, ApiError> {
    let select = query
        .apply(SeaQuery::new(operations::Entity::listing_select()))?
        .into_select();

    let page = paginate_select(select, db, page).await?;
    tracing::debug!(
        total = page.total_items,
        page = page.page,
        size = page.size,
        "Listed operations"
    );
    Ok(page.map(OperationEntry::from))
}

/// Page of `user_id`'s records, each tagged with its operation type.
/// Soft-deleted rows are included unless the query filters on `deleted`.
pub async fn list_records(
    db: &DatabaseConnection,
    user_id: i32,
    query: &ListQuery,
    page: PageRequest,
) -> Result<Page<RecordEntry>, ApiError> {
    let scoped = records::Entity::listing_select().filter(records::Column::UserId.eq(user_id));
    let select = query.apply(SeaQuery::new(scoped))?.into_select();

    let page = paginate_select(select, db, page).await?;

    let operation_ids: Vec<i32> = page.items.iter().map(|r| r.operation_id).collect();
    let types: HashMap<i32, String> = if operation_ids.is_empty() {
        HashMap::new()
    } else {
        Operations::find()
            .filter(operations::Column::Id.is_in(operation_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|op| (op.id, op.operation_type))
            .collect()
    };

    tracing::debug!(
        user_id,
        total = page.total_items,
        page = page.page,
        size = page.size,
        "Listed records"
    );
    Ok(page.map(|record| {
        let operation_type = types.get(&record.operation_id).cloned();
        RecordEntry::new(record, operation_type)
    }))
}
