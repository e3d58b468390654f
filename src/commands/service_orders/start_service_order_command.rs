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

/// Moves an order onto the shop floor: awaiting or awaiting_parts becomes
/// in_progress.
#[derive(Debug, Serialize, Deserialize)]
pub struct StartServiceOrderCommand {
    pub actor: AuthenticatedUser,
    pub order_id: Uuid,
}

#[async_trait::async_trait]
impl Command for StartServiceOrderCommand {
    type Result = service_order::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(order_id = %self.order_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        policy::authorize(&self.actor, Action::StartServiceOrder, &OwnershipCtx::default())?;

        let db = db_pool.as_ref();
        let order = service_order::Entity::find_by_id(self.order_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("service order {} not found", self.order_id))
            })?;

        if !matches!(
            order.status,
            ServiceOrderStatus::Awaiting | ServiceOrderStatus::AwaitingParts
        ) {
            return Err(ServiceError::InvalidOperation(format!(
                "cannot start a service order in status {}",
                order.status
            )));
        }

        let mut active = order.into_active_model();
        active.status = Set(ServiceOrderStatus::InProgress);
        let order = active.update(db).await?;

        if let Err(e) = event_sender.send(Event::ServiceOrderStarted(order.id)).await {
            warn!("failed to publish ServiceOrderStarted event: {}", e);
        }

        Ok(order)
    }
}
