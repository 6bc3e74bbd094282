//! Records table: one ledger row per executed operation

use sea_orm_migration::prelude::*;

use crate::m20230620_000001_create_users::Users;
use crate::m20230621_000001_create_operations::Operations;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Records::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Records::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Records::OperationId).integer().not_null())
                    .col(ColumnDef::new(Records::UserId).integer().not_null())
                    .col(ColumnDef::new(Records::Amount).double().not_null())
                    .col(ColumnDef::new(Records::OperationResponse).text().not_null())
                    .col(ColumnDef::new(Records::UserBalance).double().not_null())
                    .col(
                        ColumnDef::new(Records::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Records::Deleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_records_operation_id")
                            .from(Records::Table, Records::OperationId)
                            .to(Operations::Table, Operations::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_records_user_id")
                            .from(Records::Table, Records::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Per-user listing, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_records_user_created_at")
                    .table(Records::Table)
                    .col(Records::UserId)
                    .col(Records::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Records::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Records {
    Table,
    Id,
    OperationId,
    UserId,
    Amount,
    OperationResponse,
    UserBalance,
    CreatedAt,
    Deleted,
}
