use sea_orm_migration::prelude::*;

use crate::m20240301_000004_create_quotes_table::Quotes;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceOrders::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    // one service order per quote
                    .col(
                        ColumnDef::new(ServiceOrders::QuoteId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ServiceOrders::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ServiceOrders::EstimatedDate).date().not_null())
                    .col(
                        ColumnDef::new(ServiceOrders::CompletionDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ServiceOrders::Status)
                            .string()
                            .not_null()
                            .default("awaiting"),
                    )
                    .col(
                        ColumnDef::new(ServiceOrders::EntryMileage)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceOrders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceOrders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_orders_quote")
                            .from(ServiceOrders::Table, ServiceOrders::QuoteId)
                            .to(Quotes::Table, Quotes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_service_orders_status")
                    .table(ServiceOrders::Table)
                    .col(ServiceOrders::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServiceOrders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ServiceOrders {
    Table,
    Id,
    QuoteId,
    StartDate,
    EstimatedDate,
    CompletionDate,
    Status,
    EntryMileage,
    CreatedAt,
    UpdatedAt,
}
