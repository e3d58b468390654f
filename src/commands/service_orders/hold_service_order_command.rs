use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::auth::policy::{self, Action, OwnershipCtx};
use crate::auth::AuthenticatedUser;
use crate::commands::Command;
use crate::db::DbPool;
use crate::entities::service_order::{self, ServiceOrderStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Parks an in-progress order while it waits for parts to arrive.
#[derive(Debug, Serialize, Deserialize)]
pub struct HoldServiceOrderCommand {
    pub actor: AuthenticatedUser,
    pub order_id: Uuid,
}

#[async_trait::async_trait]
impl Command for HoldServiceOrderCommand {
    type Result = service_order::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(order_id = %self.order_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        policy::authorize(&self.actor, Action::HoldServiceOrder, &OwnershipCtx::default())?;

        let db = db_pool.as_ref();
        let order = service_order::Entity::find_by_id(self.order_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("service order {} not found", self.order_id))
            })?;

        if order.status != ServiceOrderStatus::InProgress {
            return Err(ServiceError::InvalidOperation(format!(
                "only in-progress service orders can wait for parts (current status: {})",
                order.status
            )));
        }

        let mut active = order.into_active_model();
        active.status = Set(ServiceOrderStatus::AwaitingParts);
        let order = active.update(db).await?;

        if let Err(e) = event_sender.send(Event::ServiceOrderOnHold(order.id)).await {
            warn!("failed to publish ServiceOrderOnHold event: {}", e);
        }

        Ok(order)
    }
}
