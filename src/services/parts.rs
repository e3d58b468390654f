use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::policy::{self, Action, OwnershipCtx};
use crate::auth::AuthenticatedUser;
use crate::commands::inventory::adjust_stock_command::AdjustStockCommand;
use crate::commands::Command;
use crate::db::DbPool;
use crate::entities::part::{self, PartStatus};
use crate::errors::ServiceError;
use crate::events::EventSender;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePartInput {
    #[validate(length(min = 1, max = 20))]
    pub code: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub manufacturer: String,
    #[validate(range(min = 0))]
    pub quantity_in_stock: i32,
    #[validate(range(min = 0))]
    pub minimum_stock: Option<i32>,
    #[schema(value_type = String, example = "129.90")]
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePartInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub manufacturer: Option<String>,
    #[validate(range(min = 0))]
    pub minimum_stock: Option<i32>,
    #[schema(value_type = String, example = "129.90")]
    pub unit_price: Option<Decimal>,
}

/// Availability report for a desired quantity of one part.
#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityReport {
    pub part_id: Uuid,
    pub code: String,
    pub name: String,
    pub requested_quantity: i32,
    pub available_quantity: i32,
    pub sufficient: bool,
    /// Set when the ledger would refuse the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub below_minimum: bool,
}

/// Catalog and stock operations on parts. Everything that moves
/// `quantity_in_stock` goes through the stock ledger.
#[derive(Clone)]
pub struct PartService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl PartService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_part(
        &self,
        actor: &AuthenticatedUser,
        input: CreatePartInput,
    ) -> Result<part::Model, ServiceError> {
        input.validate()?;
        policy::authorize(actor, Action::ManageCatalog, &OwnershipCtx::default())?;

        if input.unit_price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "unit price must not be negative".to_string(),
            ));
        }

        let db = self.db_pool.as_ref();
        let existing = part::Entity::find()
            .filter(part::Column::Code.eq(input.code.clone()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "a part with code {} already exists",
                input.code
            )));
        }

        let status = if input.quantity_in_stock == 0 {
            PartStatus::OutOfStock
        } else {
            PartStatus::Available
        };
        let model = part::ActiveModel {
            code: Set(input.code),
            name: Set(input.name),
            description: Set(input.description.unwrap_or_default()),
            manufacturer: Set(input.manufacturer),
            quantity_in_stock: Set(input.quantity_in_stock),
            minimum_stock: Set(input.minimum_stock.unwrap_or(5)),
            unit_price: Set(input.unit_price),
            status: Set(status),
            ..Default::default()
        };
        Ok(model.insert(db).await?)
    }

    /// Scalar catalog edits. Stock is deliberately absent from the input;
    /// it only moves through [`Self::adjust_stock`].
    #[instrument(skip(self, input))]
    pub async fn update_part(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
        input: UpdatePartInput,
    ) -> Result<part::Model, ServiceError> {
        input.validate()?;
        policy::authorize(actor, Action::ManageCatalog, &OwnershipCtx::default())?;

        if input.unit_price.map_or(false, |p| p < Decimal::ZERO) {
            return Err(ServiceError::ValidationError(
                "unit price must not be negative".to_string(),
            ));
        }

        let part = self.get_part(id).await?;
        let mut active = part.into_active_model();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(manufacturer) = input.manufacturer {
            active.manufacturer = Set(manufacturer);
        }
        if let Some(minimum_stock) = input.minimum_stock {
            active.minimum_stock = Set(minimum_stock);
        }
        if let Some(unit_price) = input.unit_price {
            active.unit_price = Set(unit_price);
        }
        Ok(active.update(self.db_pool.as_ref()).await?)
    }

    pub async fn get_part(&self, id: Uuid) -> Result<part::Model, ServiceError> {
        part::Entity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("part {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_parts(
        &self,
        manufacturer: Option<String>,
        status: Option<PartStatus>,
        below_minimum: Option<bool>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<part::Model>, u64), ServiceError> {
        let mut query = part::Entity::find().order_by_asc(part::Column::Name);
        if let Some(manufacturer) = manufacturer {
            query = query.filter(part::Column::Manufacturer.contains(&manufacturer));
        }
        if let Some(status) = status {
            query = query.filter(part::Column::Status.eq(status));
        }
        match below_minimum {
            Some(true) => {
                query = query.filter(
                    Expr::col(part::Column::QuantityInStock)
                        .lte(Expr::col(part::Column::MinimumStock)),
                );
            }
            Some(false) => {
                query = query.filter(
                    Expr::col(part::Column::QuantityInStock)
                        .gt(Expr::col(part::Column::MinimumStock)),
                );
            }
            None => {}
        }

        let paginator = query.paginate(self.db_pool.as_ref(), per_page);
        let total = paginator.num_items().await?;
        let parts = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((parts, total))
    }

    /// Answers "could the ledger satisfy this request right now?" without
    /// touching anything.
    #[instrument(skip(self))]
    pub async fn check_availability(
        &self,
        part_id: Uuid,
        requested: i32,
    ) -> Result<AvailabilityReport, ServiceError> {
        if requested <= 0 {
            return Err(ServiceError::ValidationError(
                "requested quantity must be greater than zero".to_string(),
            ));
        }
        let part = self.get_part(part_id).await?;
        let verdict = super::stock::check_availability(&part, requested);
        Ok(AvailabilityReport {
            part_id: part.id,
            code: part.code.clone(),
            name: part.name.clone(),
            requested_quantity: requested,
            available_quantity: part.quantity_in_stock,
            sufficient: verdict.is_ok(),
            reason: verdict.err().map(|e| e.to_string()),
            below_minimum: part.below_minimum(),
        })
    }

    pub async fn adjust_stock(
        &self,
        actor: &AuthenticatedUser,
        part_id: Uuid,
        adjustment: i32,
        reason: Option<String>,
    ) -> Result<part::Model, ServiceError> {
        let command = AdjustStockCommand {
            actor: actor.clone(),
            part_id,
            adjustment,
            reason,
        };
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Takes the part off the catalog. Stock stays and may still be
    /// consumed, but the status no longer auto-derives.
    #[instrument(skip(self))]
    pub async fn discontinue(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
    ) -> Result<part::Model, ServiceError> {
        policy::authorize(actor, Action::ManageCatalog, &OwnershipCtx::default())?;
        let part = self.get_part(id).await?;
        if part.status == PartStatus::Discontinued {
            return Err(ServiceError::InvalidOperation(
                "part is already discontinued".to_string(),
            ));
        }
        let mut active = part.into_active_model();
        active.status = Set(PartStatus::Discontinued);
        Ok(active.update(self.db_pool.as_ref()).await?)
    }

    /// Brings a discontinued part back; the status re-derives from the
    /// current quantity.
    #[instrument(skip(self))]
    pub async fn reactivate(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
    ) -> Result<part::Model, ServiceError> {
        policy::authorize(actor, Action::ManageCatalog, &OwnershipCtx::default())?;
        let part = self.get_part(id).await?;
        if part.status != PartStatus::Discontinued {
            return Err(ServiceError::InvalidOperation(
                "only discontinued parts can be reactivated".to_string(),
            ));
        }
        let status = if part.quantity_in_stock == 0 {
            PartStatus::OutOfStock
        } else {
            PartStatus::Available
        };
        let mut active = part.into_active_model();
        active.status = Set(status);
        Ok(active.update(self.db_pool.as_ref()).await?)
    }
}
