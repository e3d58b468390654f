use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One requested quantity of one part against one service order.
///
/// `stock_reduced` gates the ledger: it flips true at most once per real
/// decrement and back to false at most once per reversal, so stock is never
/// double-counted no matter how often the order is re-saved.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "part_usage_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub service_order_id: Uuid,
    pub part_id: Uuid,
    pub quantity: i32,
    /// Price agreed at the time the line was added, not the catalog price.
    pub unit_price_charged: Decimal,
    pub stock_reduced: bool,
    pub created_at: DateTimeUtc,
}

impl Model {
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price_charged
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::service_order::Entity",
        from = "Column::ServiceOrderId",
        to = "super::service_order::Column::Id"
    )]
    ServiceOrder,
    #[sea_orm(
        belongs_to = "super::part::Entity",
        from = "Column::PartId",
        to = "super::part::Column::Id"
    )]
    Part,
}

impl Related<super::service_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceOrder.def()
    }
}

impl Related<super::part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Part.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if insert {
            if let ActiveValue::NotSet = active_model.id {
                active_model.id = Set(Uuid::new_v4());
            }
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn line_total_is_quantity_times_charged_price() {
        let line = Model {
            id: Uuid::new_v4(),
            service_order_id: Uuid::new_v4(),
            part_id: Uuid::new_v4(),
            quantity: 3,
            unit_price_charged: dec!(19.90),
            stock_reduced: false,
            created_at: Utc::now(),
        };
        assert_eq!(line.line_total(), dec!(59.70));
    }
}
