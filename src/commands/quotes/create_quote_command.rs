use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::policy::{self, Action, OwnershipCtx};
use crate::auth::AuthenticatedUser;
use crate::commands::Command;
use crate::db::DbPool;
use crate::entities::quote::{self, QuoteStatus};
use crate::entities::user::{self, UserRole};
use crate::entities::vehicle;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateQuoteCommand {
    pub actor: AuthenticatedUser,
    pub vehicle_id: Uuid,
    /// Responsible mechanic or manager for the work.
    pub mechanic_id: Uuid,
    #[validate(length(min = 1, max = 2000))]
    pub problem_description: String,
    pub labor_value: Decimal,
    pub parts_value: Decimal,
    pub valid_until: NaiveDate,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[async_trait::async_trait]
impl Command for CreateQuoteCommand {
    type Result = quote::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(vehicle_id = %self.vehicle_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        policy::authorize(&self.actor, Action::CreateQuote, &OwnershipCtx::default())?;

        if self.labor_value < Decimal::ZERO || self.parts_value < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "labor and parts values must not be negative".to_string(),
            ));
        }

        let db = db_pool.as_ref();

        vehicle::Entity::find_by_id(self.vehicle_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("vehicle {} not found", self.vehicle_id))
            })?;

        let mechanic = user::Entity::find_by_id(self.mechanic_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {} not found", self.mechanic_id)))?;
        if mechanic.role == UserRole::Customer {
            return Err(ServiceError::ValidationError(
                "the responsible user must be a mechanic or manager".to_string(),
            ));
        }

        let quote = quote::ActiveModel {
            vehicle_id: Set(self.vehicle_id),
            mechanic_id: Set(self.mechanic_id),
            problem_description: Set(self.problem_description.clone()),
            labor_value: Set(self.labor_value),
            parts_value: Set(self.parts_value),
            total_value: Set(self.labor_value + self.parts_value),
            valid_until: Set(self.valid_until),
            status: Set(QuoteStatus::Pending),
            notes: Set(self.notes.clone().unwrap_or_default()),
            ..Default::default()
        };
        let quote = quote.insert(db).await?;

        info!(quote_id = %quote.id, "quote created");
        if let Err(e) = event_sender.send(Event::QuoteCreated(quote.id)).await {
            warn!("failed to publish QuoteCreated event: {}", e);
        }

        Ok(quote)
    }
}
