use async_trait::async_trait;
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Service order lifecycle.
///
/// awaiting -> in_progress -> { concluded | awaiting_parts -> in_progress },
/// and any non-cancelled state -> cancelled. Cancelling a concluded order is
/// the reversal path: it puts every consumed part back into stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
#[serde(rename_all = "snake_case")]
pub enum ServiceOrderStatus {
    #[sea_orm(string_value = "awaiting")]
    Awaiting,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "awaiting_parts")]
    AwaitingParts,
    #[sea_orm(string_value = "concluded")]
    Concluded,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl ServiceOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceOrderStatus::Awaiting => "awaiting",
            ServiceOrderStatus::InProgress => "in_progress",
            ServiceOrderStatus::AwaitingParts => "awaiting_parts",
            ServiceOrderStatus::Concluded => "concluded",
            ServiceOrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ServiceOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Exactly one service order per approved quote.
    #[sea_orm(unique)]
    pub quote_id: Uuid,
    pub start_date: DateTimeUtc,
    pub estimated_date: Date,
    /// Set when the order is concluded; never precedes start_date.
    pub completion_date: Option<DateTimeUtc>,
    pub status: ServiceOrderStatus,
    pub entry_mileage: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::quote::Entity",
        from = "Column::QuoteId",
        to = "super::quote::Column::Id"
    )]
    Quote,
    #[sea_orm(has_many = "super::part_usage_line::Entity")]
    UsageLines,
}

impl Related<super::quote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quote.def()
    }
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
