use sea_orm_migration::prelude::*;

use crate::m20240301_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vehicles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Vehicles::Id).uuid().primary_key().not_null())
                    .col(
                        ColumnDef::new(Vehicles::LicensePlate)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Vehicles::Make).string().not_null())
                    .col(ColumnDef::new(Vehicles::Model).string().not_null())
                    .col(ColumnDef::new(Vehicles::Year).integer().not_null())
                    .col(ColumnDef::new(Vehicles::Color).string().not_null())
                    .col(ColumnDef::new(Vehicles::OwnerId).uuid().not_null())
                    .col(
                        ColumnDef::new(Vehicles::Notes)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Vehicles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicles_owner")
                            .from(Vehicles::Table, Vehicles::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_vehicles_owner")
                    .table(Vehicles::Table)
                    .col(Vehicles::OwnerId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vehicles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Vehicles {
    Table,
    Id,
    LicensePlate,
    Make,
    Model,
    Year,
    Color,
    OwnerId,
    Notes,
    CreatedAt,
}
