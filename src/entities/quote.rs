use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Quote lifecycle. Transitions are one-directional: a quote only ever
/// leaves `Pending`, and never re-enters it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "expired")]
    Expired,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Pending => "pending",
            QuoteStatus::Approved => "approved",
            QuoteStatus::Rejected => "rejected",
            QuoteStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quotes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub vehicle_id: Uuid,
    /// Responsible mechanic or manager.
    pub mechanic_id: Uuid,
    pub problem_description: String,
    pub labor_value: Decimal,
    pub parts_value: Decimal,
    /// Always labor_value + parts_value; recomputed on every save.
    pub total_value: Decimal,
    pub valid_until: Date,
    pub status: QuoteStatus,
    /// Append-only audit trail; rejection reasons land here.
    pub notes: String,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::Id"
    )]
    Vehicle,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::MechanicId",
        to = "super::user::Column::Id"
    )]
    Mechanic,
    #[sea_orm(has_one = "super::service_order::Entity")]
    ServiceOrder,
}

impl Related<super::vehicle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicle.def()
    }
}

impl Related<super::service_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceOrder.def()
    }
}

fn decimal_of(value: &ActiveValue<Decimal>) -> Decimal {
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => *v,
        ActiveValue::NotSet => Decimal::ZERO,
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

        // The total is derived; whatever the caller put there is overwritten.
        let total = decimal_of(&active_model.labor_value) + decimal_of(&active_model.parts_value);
        active_model.total_value = Set(total);

        Ok(active_model)
    }
}
