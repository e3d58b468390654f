use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::policy::{self, Action, OwnershipCtx};
use crate::auth::AuthenticatedUser;
use crate::commands::Command;
use crate::db::DbPool;
use crate::entities::part;
use crate::entities::part_usage_line;
use crate::entities::service_order::{self, ServiceOrderStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::stock;

/// Attaches a part requirement to a service order.
///
/// The ledger is consulted but not touched: stock only moves when the order
/// concludes. A part can appear at most once per order.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AddPartCommand {
    pub actor: AuthenticatedUser,
    pub order_id: Uuid,
    pub part_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_price_charged: Decimal,
}

#[async_trait::async_trait]
impl Command for AddPartCommand {
    type Result = part_usage_line::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(order_id = %self.order_id, part_id = %self.part_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        policy::authorize(&self.actor, Action::AddPart, &OwnershipCtx::default())?;

        if self.unit_price_charged < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "unit price must not be negative".to_string(),
            ));
        }

        let db = db_pool.as_ref();

        let order = service_order::Entity::find_by_id(self.order_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("service order {} not found", self.order_id))
            })?;

        if matches!(
            order.status,
            ServiceOrderStatus::Concluded | ServiceOrderStatus::Cancelled
        ) {
            return Err(ServiceError::InvalidOperation(format!(
                "cannot add parts to a service order in status {}",
                order.status
            )));
        }

        let duplicate = part_usage_line::Entity::find()
            .filter(part_usage_line::Column::ServiceOrderId.eq(self.order_id))
            .filter(part_usage_line::Column::PartId.eq(self.part_id))
            .one(db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "part {} is already listed on service order {}",
                self.part_id, self.order_id
            )));
        }

        let part = part::Entity::find_by_id(self.part_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("part {} not found", self.part_id)))?;
        stock::check_availability(&part, self.quantity)?;

        let line = part_usage_line::ActiveModel {
            service_order_id: Set(self.order_id),
            part_id: Set(self.part_id),
            quantity: Set(self.quantity),
            unit_price_charged: Set(self.unit_price_charged),
            stock_reduced: Set(false),
            ..Default::default()
        };
        let line = line.insert(db).await?;

        info!(line_id = %line.id, "part added to service order");
        if let Err(e) = event_sender
            .send(Event::PartAddedToOrder {
                order_id: self.order_id,
                part_id: self.part_id,
                quantity: self.quantity,
            })
            .await
        {
            warn!("failed to publish PartAddedToOrder event: {}", e);
        }

        Ok(line)
    }
}
