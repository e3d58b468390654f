use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::policy::{self, Action, OwnershipCtx};
use crate::auth::AuthenticatedUser;
use crate::commands::Command;
use crate::db::DbPool;
use crate::entities::quote::{self, QuoteStatus};
use crate::entities::service_order::{self, ServiceOrderStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Turns an approved quote into a service order.
///
/// A quote yields at most one order; repeating the call is a conflict, and
/// nothing is written when a precondition fails.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateServiceOrderCommand {
    pub actor: AuthenticatedUser,
    pub quote_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub estimated_date: NaiveDate,
    pub entry_mileage: i32,
}

#[async_trait::async_trait]
impl Command for GenerateServiceOrderCommand {
    type Result = service_order::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(quote_id = %self.quote_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        if self.entry_mileage < 0 {
            return Err(ServiceError::ValidationError(
                "entry mileage must not be negative".to_string(),
            ));
        }

        let db = db_pool.as_ref();

        let quote = quote::Entity::find_by_id(self.quote_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("quote {} not found", self.quote_id)))?;

        policy::authorize(
            &self.actor,
            Action::GenerateServiceOrder,
            &OwnershipCtx {
                vehicle_owner: None,
                assigned_mechanic: Some(quote.mechanic_id),
            },
        )?;

        if quote.status != QuoteStatus::Approved {
            return Err(ServiceError::InvalidOperation(format!(
                "only approved quotes can generate a service order (current status: {})",
                quote.status
            )));
        }

        let existing = service_order::Entity::find()
            .filter(service_order::Column::QuoteId.eq(self.quote_id))
            .one(db)
            .await?;
        if let Some(existing) = existing {
            return Err(ServiceError::Conflict(format!(
                "a service order ({}) already exists for quote {}",
                existing.id, self.quote_id
            )));
        }

        let order = service_order::ActiveModel {
            quote_id: Set(self.quote_id),
            start_date: Set(self.start_date),
            estimated_date: Set(self.estimated_date),
            completion_date: Set(None),
            status: Set(ServiceOrderStatus::Awaiting),
            entry_mileage: Set(self.entry_mileage),
            ..Default::default()
        };
        let order = order.insert(db).await?;

        info!(order_id = %order.id, quote_id = %self.quote_id, "service order generated");
        if let Err(e) = event_sender
            .send(Event::ServiceOrderCreated {
                order_id: order.id,
                quote_id: self.quote_id,
            })
            .await
        {
            warn!("failed to publish ServiceOrderCreated event: {}", e);
        }

        Ok(order)
    }
}
