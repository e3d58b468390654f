use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Parts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Parts::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Parts::Code).string().not_null().unique_key())
                    .col(ColumnDef::new(Parts::Name).string().not_null())
                    .col(
                        ColumnDef::new(Parts::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Parts::Manufacturer).string().not_null())
                    .col(
                        ColumnDef::new(Parts::QuantityInStock)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Parts::MinimumStock)
                            .integer()
                            .not_null()
                            .default(5),
                    )
                    .col(ColumnDef::new(Parts::UnitPrice).decimal().not_null())
                    .col(
                        ColumnDef::new(Parts::Status)
                            .string()
                            .not_null()
                            .default("available"),
                    )
                    .col(
                        ColumnDef::new(Parts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Parts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Parts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Parts {
    Table,
    Id,
    Code,
    Name,
    Description,
    Manufacturer,
    QuantityInStock,
    MinimumStock,
    UnitPrice,
    Status,
    CreatedAt,
    UpdatedAt,
}
