use sea_orm_migration::prelude::*;

use crate::m20240301_000001_create_users_table::Users;
use crate::m20240301_000002_create_vehicles_table::Vehicles;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Quotes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Quotes::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Quotes::VehicleId).uuid().not_null())
                    .col(ColumnDef::new(Quotes::MechanicId).uuid().not_null())
                    .col(
                        ColumnDef::new(Quotes::ProblemDescription)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Quotes::LaborValue).decimal().not_null())
                    .col(
                        ColumnDef::new(Quotes::PartsValue)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Quotes::TotalValue).decimal().not_null())
                    .col(ColumnDef::new(Quotes::ValidUntil).date().not_null())
                    .col(
                        ColumnDef::new(Quotes::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Quotes::Notes).text().not_null().default(""))
                    .col(
                        ColumnDef::new(Quotes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Quotes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quotes_vehicle")
                            .from(Quotes::Table, Quotes::VehicleId)
                            .to(Vehicles::Table, Vehicles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quotes_mechanic")
                            .from(Quotes::Table, Quotes::MechanicId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_quotes_vehicle")
                    .table(Quotes::Table)
                    .col(Quotes::VehicleId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_quotes_status")
                    .table(Quotes::Table)
                    .col(Quotes::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Quotes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Quotes {
    Table,
    Id,
    VehicleId,
    MechanicId,
    ProblemDescription,
    LaborValue,
    PartsValue,
    TotalValue,
    ValidUntil,
    Status,
    Notes,
    CreatedAt,
    UpdatedAt,
}
