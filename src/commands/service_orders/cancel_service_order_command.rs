use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::policy::{self, Action, OwnershipCtx};
use crate::auth::AuthenticatedUser;
use crate::commands::Command;
use crate::db::DbPool;
use crate::entities::part_usage_line;
use crate::entities::service_order::{self, ServiceOrderStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::stock;

/// Cancels a service order and puts back every unit of stock it consumed.
///
/// Cancelling a concluded order is the reversal path: each line that was
/// decremented is incremented again and its flag cleared, all in the same
/// transaction as the status write.
#[derive(Debug, Serialize, Deserialize)]
pub struct CancelServiceOrderCommand {
    pub actor: AuthenticatedUser,
    pub order_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CancelServiceOrderResult {
    pub order: service_order::Model,
    /// Lines whose stock effect was actually reversed by this call.
    pub reverted: Vec<part_usage_line::Model>,
}

#[async_trait::async_trait]
impl Command for CancelServiceOrderCommand {
    type Result = CancelServiceOrderResult;

    #[instrument(skip(self, db_pool, event_sender), fields(order_id = %self.order_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        policy::authorize(
            &self.actor,
            Action::CancelServiceOrder,
            &OwnershipCtx::default(),
        )?;

        let txn = db_pool.begin().await?;

        let order = service_order::Entity::find_by_id(self.order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("service order {} not found", self.order_id))
            })?;

        if order.status == ServiceOrderStatus::Cancelled {
            return Err(ServiceError::InvalidOperation(
                "service order is already cancelled".to_string(),
            ));
        }

        let mut active = order.into_active_model();
        active.status = Set(ServiceOrderStatus::Cancelled);
        let order = active.update(&txn).await?;

        let lines = part_usage_line::Entity::find()
            .filter(part_usage_line::Column::ServiceOrderId.eq(self.order_id))
            .all(&txn)
            .await?;

        let mut reverted = Vec::new();
        for line in &lines {
            if let Some(updated) = stock::revert_line_usage(&txn, line).await? {
                reverted.push(updated);
            }
        }

        txn.commit().await?;

        info!(order_id = %order.id, reverted = reverted.len(), "service order cancelled");
        for line in &reverted {
            if let Err(e) = event_sender
                .send(Event::PartUsageReverted {
                    order_id: order.id,
                    part_id: line.part_id,
                    quantity: line.quantity,
                })
                .await
            {
                warn!("failed to publish PartUsageReverted event: {}", e);
            }
        }
        if let Err(e) = event_sender
            .send(Event::ServiceOrderCancelled(order.id))
            .await
        {
            warn!("failed to publish ServiceOrderCancelled event: {}", e);
        }

        Ok(CancelServiceOrderResult { order, reverted })
    }
}
