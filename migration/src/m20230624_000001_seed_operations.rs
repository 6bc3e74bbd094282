//! Seeds the operation catalog

use sea_orm_migration::prelude::*;

use crate::m20230621_000001_create_operations::Operations;

const BINARY_FIELDS: &str = r#"{"A": {"type": "number"}, "B": {"type": "number"}}"#;
const UNARY_FIELDS: &str = r#"{"A": {"type": "number"}}"#;

const CATALOG: [(&str, f64, &str); 5] = [
    ("addition", 0.1, BINARY_FIELDS),
    ("subtraction", 0.1, BINARY_FIELDS),
    ("division", 0.2, BINARY_FIELDS),
    ("square_root", 0.3, UNARY_FIELDS),
    ("random_string", 0.5, "{}"),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert()
            .into_table(Operations::Table)
            .columns([Operations::Type, Operations::Cost, Operations::Fields])
            .to_owned();

        for (operation_type, cost, fields) in CATALOG {
            insert.values_panic([operation_type.into(), cost.into(), fields.into()]);
        }

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let types: Vec<&str> = CATALOG.iter().map(|(operation_type, _, _)| *operation_type).collect();
        let delete = Query::delete()
            .from_table(Operations::Table)
            .and_where(Expr::col(Operations::Type).is_in(types))
            .to_owned();

        manager.exec_stmt(delete).await
    }
}
