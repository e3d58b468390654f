use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::commands::quotes::{
    approve_quote_command::ApproveQuoteCommand, create_quote_command::CreateQuoteCommand,
    generate_service_order_command::GenerateServiceOrderCommand,
    reject_quote_command::RejectQuoteCommand, update_quote_command::UpdateQuoteCommand,
};
use crate::commands::Command;
use crate::db::DbPool;
use crate::entities::user::UserRole;
use crate::entities::{
    quote::{self, QuoteStatus},
    service_order, vehicle,
};
use crate::errors::ServiceError;
use crate::events::EventSender;

/// Service for managing quotes and their workflow actions. Writes are
/// delegated to commands; reads enforce role visibility (customers see
/// quotes on their own vehicles, mechanics the ones assigned to them,
/// managers everything).
#[derive(Clone)]
pub struct QuoteService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl QuoteService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    pub async fn create_quote(
        &self,
        command: CreateQuoteCommand,
    ) -> Result<quote::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn update_quote(
        &self,
        command: UpdateQuoteCommand,
    ) -> Result<quote::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn approve_quote(
        &self,
        command: ApproveQuoteCommand,
    ) -> Result<quote::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn reject_quote(
        &self,
        command: RejectQuoteCommand,
    ) -> Result<quote::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn generate_service_order(
        &self,
        command: GenerateServiceOrderCommand,
    ) -> Result<service_order::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Fetches one quote, hidden from callers outside its visibility rules.
    #[instrument(skip(self, actor))]
    pub async fn get_quote(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
    ) -> Result<quote::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let quote = quote::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("quote {} not found", id)))?;

        match actor.role {
            UserRole::Manager => Ok(quote),
            UserRole::Mechanic => {
                if quote.mechanic_id == actor.id {
                    Ok(quote)
                } else {
                    Err(ServiceError::NotFound(format!("quote {} not found", id)))
                }
            }
            UserRole::Customer => {
                let vehicle = vehicle::Entity::find_by_id(quote.vehicle_id)
                    .one(db)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::ConsistencyError(format!(
                            "vehicle {} referenced by quote {} is missing",
                            quote.vehicle_id, quote.id
                        ))
                    })?;
                if vehicle.owner_id == actor.id {
                    Ok(quote)
                } else {
                    Err(ServiceError::NotFound(format!("quote {} not found", id)))
                }
            }
        }
    }

    /// Lists quotes visible to the caller, newest first.
    #[instrument(skip(self, actor))]
    pub async fn list_quotes(
        &self,
        actor: &AuthenticatedUser,
        status: Option<QuoteStatus>,
        vehicle_id: Option<Uuid>,
        created_from: Option<NaiveDate>,
        created_to: Option<NaiveDate>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<quote::Model>, u64), ServiceError> {
        let mut query = quote::Entity::find().order_by_desc(quote::Column::CreatedAt);

        query = match actor.role {
            UserRole::Manager => query,
            UserRole::Mechanic => query.filter(quote::Column::MechanicId.eq(actor.id)),
            UserRole::Customer => query
                .join(JoinType::InnerJoin, quote::Relation::Vehicle.def())
                .filter(vehicle::Column::OwnerId.eq(actor.id)),
        };

        if let Some(status) = status {
            query = query.filter(quote::Column::Status.eq(status));
        }
        if let Some(vehicle_id) = vehicle_id {
            query = query.filter(quote::Column::VehicleId.eq(vehicle_id));
        }
        if let Some(from) = created_from {
            query = query.filter(
                quote::Column::CreatedAt.gte(from.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()),
            );
        }
        if let Some(to) = created_to {
            query = query.filter(
                quote::Column::CreatedAt
                    .lte(to.and_hms_opt(23, 59, 59).unwrap_or_default().and_utc()),
            );
        }

        let paginator = query.paginate(self.db_pool.as_ref(), per_page);
        let total = paginator.num_items().await?;
        let quotes = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((quotes, total))
    }
}
