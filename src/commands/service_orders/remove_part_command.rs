use sea_orm::{ColumnTrait, EntityTrait, ModelTrait, QueryFilter, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::policy::{self, Action, OwnershipCtx};
use crate::auth::AuthenticatedUser;
use crate::commands::Command;
use crate::db::DbPool;
use crate::entities::part_usage_line;
use crate::entities::service_order;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::stock;

/// Removes a usage line from a service order.
///
/// If the line already consumed stock, the reversal and the delete share a
/// transaction so the units can never be lost.
#[derive(Debug, Serialize, Deserialize)]
pub struct RemovePartCommand {
    pub actor: AuthenticatedUser,
    pub order_id: Uuid,
    pub part_id: Uuid,
}

#[async_trait::async_trait]
impl Command for RemovePartCommand {
    type Result = ();

    #[instrument(skip(self, db_pool, event_sender), fields(order_id = %self.order_id, part_id = %self.part_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        policy::authorize(&self.actor, Action::RemovePart, &OwnershipCtx::default())?;

        let txn = db_pool.begin().await?;

        service_order::Entity::find_by_id(self.order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("service order {} not found", self.order_id))
            })?;

        let line = part_usage_line::Entity::find()
            .filter(part_usage_line::Column::ServiceOrderId.eq(self.order_id))
            .filter(part_usage_line::Column::PartId.eq(self.part_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "part {} is not listed on service order {}",
                    self.part_id, self.order_id
                ))
            })?;

        // Put the stock back before the row (and its flag) disappears.
        let line = match stock::revert_line_usage(&txn, &line).await? {
            Some(updated) => updated,
            None => line,
        };
        line.delete(&txn).await?;

        txn.commit().await?;

        info!(order_id = %self.order_id, part_id = %self.part_id, "part removed from service order");
        if let Err(e) = event_sender
            .send(Event::PartRemovedFromOrder {
                order_id: self.order_id,
                part_id: self.part_id,
            })
            .await
        {
            warn!("failed to publish PartRemovedFromOrder event: {}", e);
        }

        Ok(())
    }
}
