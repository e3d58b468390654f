use sea_orm_migration::prelude::*;

use crate::m20240301_000003_create_parts_table::Parts;
use crate::m20240301_000005_create_service_orders_table::ServiceOrders;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PartUsageLines::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PartUsageLines::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartUsageLines::ServiceOrderId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PartUsageLines::PartId).uuid().not_null())
                    .col(ColumnDef::new(PartUsageLines::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(PartUsageLines::UnitPriceCharged)
                            .decimal()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartUsageLines::StockReduced)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PartUsageLines::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_part_usage_lines_service_order")
                            .from(PartUsageLines::Table, PartUsageLines::ServiceOrderId)
                            .to(ServiceOrders::Table, ServiceOrders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_part_usage_lines_part")
                            .from(PartUsageLines::Table, PartUsageLines::PartId)
                            .to(Parts::Table, Parts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // a part can appear at most once per service order
        manager
            .create_index(
                Index::create()
                    .name("idx_part_usage_lines_order_part")
                    .table(PartUsageLines::Table)
                    .col(PartUsageLines::ServiceOrderId)
                    .col(PartUsageLines::PartId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PartUsageLines::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PartUsageLines {
    Table,
    Id,
    ServiceOrderId,
    PartId,
    Quantity,
    UnitPriceCharged,
    StockReduced,
    CreatedAt,
}
