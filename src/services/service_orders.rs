use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::commands::service_orders::{
    add_part_command::AddPartCommand,
    cancel_service_order_command::{CancelServiceOrderCommand, CancelServiceOrderResult},
    conclude_service_order_command::{ConcludeServiceOrderCommand, ConcludeServiceOrderResult},
    hold_service_order_command::HoldServiceOrderCommand,
    remove_part_command::RemovePartCommand,
    start_service_order_command::StartServiceOrderCommand,
};
use crate::commands::Command;
use crate::db::DbPool;
use crate::entities::{
    part_usage_line,
    service_order::{self, ServiceOrderStatus},
};
use crate::errors::ServiceError;
use crate::events::EventSender;

/// Service for managing service orders. All state transitions go through
/// commands so the stock reconciliation rules cannot be bypassed.
#[derive(Clone)]
pub struct ServiceOrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ServiceOrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    pub async fn add_part(
        &self,
        command: AddPartCommand,
    ) -> Result<part_usage_line::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn remove_part(&self, command: RemovePartCommand) -> Result<(), ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn start(
        &self,
        command: StartServiceOrderCommand,
    ) -> Result<service_order::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn hold(
        &self,
        command: HoldServiceOrderCommand,
    ) -> Result<service_order::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn conclude(
        &self,
        command: ConcludeServiceOrderCommand,
    ) -> Result<ConcludeServiceOrderResult, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn cancel(
        &self,
        command: CancelServiceOrderCommand,
    ) -> Result<CancelServiceOrderResult, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Fetches one order together with its usage lines.
    #[instrument(skip(self))]
    pub async fn get_order(
        &self,
        id: Uuid,
    ) -> Result<(service_order::Model, Vec<part_usage_line::Model>), ServiceError> {
        let db = self.db_pool.as_ref();
        let order = service_order::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("service order {} not found", id)))?;
        let lines = part_usage_line::Entity::find()
            .filter(part_usage_line::Column::ServiceOrderId.eq(id))
            .all(db)
            .await?;
        Ok((order, lines))
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        status: Option<ServiceOrderStatus>,
        quote_id: Option<Uuid>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<service_order::Model>, u64), ServiceError> {
        let mut query =
            service_order::Entity::find().order_by_desc(service_order::Column::StartDate);
        if let Some(status) = status {
            query = query.filter(service_order::Column::Status.eq(status));
        }
        if let Some(quote_id) = quote_id {
            query = query.filter(service_order::Column::QuoteId.eq(quote_id));
        }

        let paginator = query.paginate(self.db_pool.as_ref(), per_page);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((orders, total))
    }
}
