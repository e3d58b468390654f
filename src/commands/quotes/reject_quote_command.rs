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

const MIN_REASON_LEN: usize = 10;

/// Customer rejection of a pending quote, with a mandatory reason that is
/// appended to the quote's notes as an attributed audit entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct RejectQuoteCommand {
    pub actor: AuthenticatedUser,
    pub quote_id: Uuid,
    pub reason: String,
}

#[async_trait::async_trait]
impl Command for RejectQuoteCommand {
    type Result = quote::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(quote_id = %self.quote_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let reason = self.reason.trim();
        if reason.chars().count() < MIN_REASON_LEN {
            return Err(ServiceError::ValidationError(format!(
                "rejection reason must have at least {} characters",
                MIN_REASON_LEN
            )));
        }

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
            Action::RejectQuote,
            &OwnershipCtx::vehicle_owner(vehicle.owner_id),
        )?;

        if quote.status != QuoteStatus::Pending {
            return Err(ServiceError::InvalidOperation(format!(
                "cannot reject a quote in status {}",
                quote.status
            )));
        }

        // Prior notes are never overwritten; rejections accumulate.
        let audit_entry = format!(
            "\n\n[rejected at {} by {}]\n{}",
            Utc::now().format("%Y-%m-%d %H:%M"),
            self.actor.username,
            reason
        );
        let notes = format!("{}{}", quote.notes, audit_entry);

        let mut active = quote.into_active_model();
        active.status = Set(QuoteStatus::Rejected);
        active.notes = Set(notes);
        let rejected = active.update(db).await?;

        info!(quote_id = %rejected.id, "quote rejected");
        if let Err(e) = event_sender.send(Event::QuoteRejected(rejected.id)).await {
            warn!("failed to publish QuoteRejected event: {}", e);
        }

        Ok(rejected)
    }
}
