use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Availability status of a part.
///
/// `OutOfStock` is derived by the stock ledger (quantity hit zero) and
/// cleared automatically when stock comes back. `Discontinued` is only ever
/// set manually and survives restocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum PartStatus {
    #[sea_orm(string_value = "available")]
    Available,
    #[sea_orm(string_value = "out_of_stock")]
    OutOfStock,
    #[sea_orm(string_value = "discontinued")]
    Discontinued,
}

impl PartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartStatus::Available => "available",
            PartStatus::OutOfStock => "out_of_stock",
            PartStatus::Discontinued => "discontinued",
        }
    }
}

impl fmt::Display for PartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub description: String,
    pub manufacturer: String,
    /// Mutated only through the stock ledger, never written directly.
    pub quantity_in_stock: i32,
    pub minimum_stock: i32,
    pub unit_price: Decimal,
    pub status: PartStatus,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

impl Model {
    /// Whether the part sits at or below its reorder threshold.
    pub fn below_minimum(&self) -> bool {
        self.quantity_in_stock <= self.minimum_stock
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::part_usage_line::Entity")]
    UsageLines,
}

impl Related<super::part_usage_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UsageLines.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();
        if insert {
            if let ActiveValue::NotSet = active_model.id {
                active_model.id = Set(Uuid::new_v4());
            }
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(Some(now));
        Ok(active_model)
    }
}
