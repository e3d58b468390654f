use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::policy::{self, Action, OwnershipCtx};
use crate::auth::AuthenticatedUser;
use crate::commands::Command;
use crate::db::DbPool;
use crate::entities::quote::{self, QuoteStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Scalar edits to a pending quote. Totals are derived on save; decided
/// quotes (approved/rejected/expired) are immutable.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateQuoteCommand {
    pub actor: AuthenticatedUser,
    pub quote_id: Uuid,
    #[validate(length(min = 1, max = 2000))]
    pub problem_description: Option<String>,
    pub labor_value: Option<Decimal>,
    pub parts_value: Option<Decimal>,
    pub valid_until: Option<NaiveDate>,
}

#[async_trait::async_trait]
impl Command for UpdateQuoteCommand {
    type Result = quote::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(quote_id = %self.quote_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        if self.labor_value.map_or(false, |v| v < Decimal::ZERO)
            || self.parts_value.map_or(false, |v| v < Decimal::ZERO)
        {
            return Err(ServiceError::ValidationError(
                "labor and parts values must not be negative".to_string(),
            ));
        }

        let db = db_pool.as_ref();

        let quote = quote::Entity::find_by_id(self.quote_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("quote {} not found", self.quote_id)))?;

        policy::authorize(
            &self.actor,
            Action::UpdateQuote,
            &OwnershipCtx {
                vehicle_owner: None,
                assigned_mechanic: Some(quote.mechanic_id),
            },
        )?;

        if quote.status != QuoteStatus::Pending {
            return Err(ServiceError::InvalidOperation(format!(
                "cannot edit a quote in status {}",
                quote.status
            )));
        }

        let mut active = quote.into_active_model();
        if let Some(description) = &self.problem_description {
            active.problem_description = Set(description.clone());
        }
        if let Some(labor) = self.labor_value {
            active.labor_value = Set(labor);
        }
        if let Some(parts) = self.parts_value {
            active.parts_value = Set(parts);
        }
        if let Some(valid_until) = self.valid_until {
            active.valid_until = Set(valid_until);
        }
        let updated = active.update(db).await?;

        if let Err(e) = event_sender.send(Event::QuoteUpdated(updated.id)).await {
            warn!("failed to publish QuoteUpdated event: {}", e);
        }

        Ok(updated)
    }
}
