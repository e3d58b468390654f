pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_users_table;
mod m20240301_000002_create_vehicles_table;
mod m20240301_000003_create_parts_table;
mod m20240301_000004_create_quotes_table;
mod m20240301_000005_create_service_orders_table;
mod m20240301_000006_create_part_usage_lines_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_users_table::Migration),
            Box::new(m20240301_000002_create_vehicles_table::Migration),
            Box::new(m20240301_000003_create_parts_table::Migration),
            Box::new(m20240301_000004_create_quotes_table::Migration),
            Box::new(m20240301_000005_create_service_orders_table::Migration),
            Box::new(m20240301_000006_create_part_usage_lines_table::Migration),
        ]
    }
}
