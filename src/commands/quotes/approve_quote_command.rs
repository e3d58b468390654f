use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::policy::{self, Action, OwnershipCtx};
use crate::auth::AuthenticatedUser;
use crate::commands::Command;
use crate::db::DbPool;
use crate::entities::{
    quote::{self, QuoteStatus},
    vehicle,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Customer acceptance of a pending quote.
///
/// Approving past `valid_until` marks the quote expired and persists that
/// transition even though the call itself fails; the quote can never be
/// approved afterwards.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApproveQuoteCommand {
    pub actor: AuthenticatedUser,
    pub quote_id: Uuid,
}

#[async_trait::async_trait]
impl Command for ApproveQuoteCommand {
    type Result = quote::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(quote_id = %self.quote_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let db = db_pool.as_ref();

        let quote = quote::Entity::find_by_id(self.quote_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("quote {} not found", self.quote_id)))?;

        let vehicle = vehicle::Entity::find_by_id(quote.vehicle_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::ConsistencyError(format!(
                    "vehicle {} referenced by quote {} is missing",
                    quote.vehicle_id, quote.id
                ))
            })?;

        policy::authorize(
            &self.actor,
            Action::ApproveQuote,
            &OwnershipCtx::vehicle_owner(vehicle.owner_id),
        )?;

        if quote.status != QuoteStatus::Pending {
            return Err(ServiceError::InvalidOperation(format!(
                "cannot approve a quote in status {}",
                quote.status
            )));
        }

        if quote.valid_until < Utc::now().date_naive() {
            // The failed approval is itself an observable state change.
            let mut active = quote.into_active_model();
            active.status = Set(QuoteStatus::Expired);
            let expired = active.update(db).await?;
            if let Err(e) = event_sender.send(Event::QuoteExpired(expired.id)).await {
                warn!("failed to publish QuoteExpired event: {}", e);
            }
            return Err(ServiceError::InvalidOperation(
                "quote has expired and can no longer be approved".to_string(),
            ));
        }

        let mut active = quote.into_active_model();
        active.status = Set(QuoteStatus::Approved);
        let approved = active.update(db).await?;

        info!(quote_id = %approved.id, "quote approved");
        if let Err(e) = event_sender.send(Event::QuoteApproved(approved.id)).await {
            warn!("failed to publish QuoteApproved event: {}", e);
        }

        Ok(approved)
    }
}
