//! Operation catalog: one row per chargeable computation

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Operations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Operations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Operations::Type).string_len(30).not_null())
                    .col(
                        ColumnDef::new(Operations::Cost)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    // JSON object of field name -> metadata, kept as text
                    .col(
                        ColumnDef::new(Operations::Fields)
                            .text()
                            .not_null()
                            .default("{}"),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Operations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Operations {
    Table,
    Id,
    Type,
    Cost,
    Fields,
}
