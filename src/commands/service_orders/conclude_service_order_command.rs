use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, Opts};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::policy::{self, Action, OwnershipCtx};
use crate::auth::AuthenticatedUser;
use crate::commands::Command;
use crate::db::DbPool;
use crate::entities::part;
use crate::entities::part_usage_line;
use crate::entities::service_order::{self, ServiceOrderStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::stock;

lazy_static! {
    static ref SERVICE_ORDER_CONCLUSIONS: IntCounter = IntCounter::new(
        "service_order_conclusions_total",
        "Total number of concluded service orders"
    )
    .expect("metric can be created");
    static ref SERVICE_ORDER_CONCLUSION_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "service_order_conclusion_failures_total",
            "Total number of failed service order conclusions"
        ),
        &["error_type"]
    )
    .expect("metric can be created");
}

/// Concludes an in-progress order and confirms every usage line against the
/// stock ledger.
///
/// The status write and all line decrements share one transaction: the
/// caller observes either a concluded order with every decrement applied or
/// no change at all. A line that loses the stock race after the advisory
/// pre-check aborts the whole call.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConcludeServiceOrderCommand {
    pub actor: AuthenticatedUser,
    pub order_id: Uuid,
}

/// The concluded order together with its lines as persisted.
#[derive(Debug, Serialize)]
pub struct ConcludeServiceOrderResult {
    pub order: service_order::Model,
    pub lines: Vec<part_usage_line::Model>,
}

#[async_trait::async_trait]
impl Command for ConcludeServiceOrderCommand {
    type Result = ConcludeServiceOrderResult;

    #[instrument(skip(self, db_pool, event_sender), fields(order_id = %self.order_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        policy::authorize(
            &self.actor,
            Action::ConcludeServiceOrder,
            &OwnershipCtx::default(),
        )?;

        let txn = db_pool.begin().await?;

        let order = service_order::Entity::find_by_id(self.order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("service order {} not found", self.order_id))
            })?;

        if order.status != ServiceOrderStatus::InProgress {
            SERVICE_ORDER_CONCLUSION_FAILURES
                .with_label_values(&["invalid_status"])
                .inc();
            return Err(ServiceError::InvalidOperation(format!(
                "only in-progress service orders can be concluded (current status: {})",
                order.status
            )));
        }

        let lines = part_usage_line::Entity::find()
            .filter(part_usage_line::Column::ServiceOrderId.eq(self.order_id))
            .all(&txn)
            .await?;
        if lines.is_empty() {
            SERVICE_ORDER_CONCLUSION_FAILURES
                .with_label_values(&["no_parts"])
                .inc();
            return Err(ServiceError::InvalidOperation(
                "service order must have at least one part to be concluded".to_string(),
            ));
        }

        // Advisory pre-check so the caller gets the full list of shortages
        // instead of failing on the first one mid-decrement.
        let mut shortages = Vec::new();
        for line in lines.iter().filter(|l| !l.stock_reduced) {
            let part = part::Entity::find_by_id(line.part_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::ConsistencyError(format!(
                        "part {} referenced by line {} is missing",
                        line.part_id, line.id
                    ))
                })?;
            if let Err(err) = stock::check_availability(&part, line.quantity) {
                shortages.push(err.to_string());
            }
        }
        if !shortages.is_empty() {
            SERVICE_ORDER_CONCLUSION_FAILURES
                .with_label_values(&["insufficient_stock"])
                .inc();
            return Err(ServiceError::InsufficientStock(format!(
                "cannot conclude service order {}: {}",
                self.order_id,
                shortages.join("; ")
            )));
        }

        let now = Utc::now();
        if now < order.start_date {
            SERVICE_ORDER_CONCLUSION_FAILURES
                .with_label_values(&["completion_before_start"])
                .inc();
            return Err(ServiceError::InvalidOperation(
                "completion date would precede the order's start date".to_string(),
            ));
        }

        let mut active = order.into_active_model();
        active.status = Set(ServiceOrderStatus::Concluded);
        active.completion_date = Set(Some(now));
        let order = active.update(&txn).await?;

        // The authoritative decrement. A failure here rolls everything back,
        // including the status flip above.
        let mut confirmed = Vec::with_capacity(lines.len());
        for line in &lines {
            match stock::confirm_line_usage(&txn, line).await? {
                Some(updated) => confirmed.push(updated),
                None => confirmed.push(line.clone()),
            }
        }

        txn.commit().await?;
        SERVICE_ORDER_CONCLUSIONS.inc();

        info!(order_id = %order.id, line_count = confirmed.len(), "service order concluded");
        for line in &confirmed {
            if let Err(e) = event_sender
                .send(Event::PartUsageConfirmed {
                    order_id: order.id,
                    part_id: line.part_id,
                    quantity: line.quantity,
                })
                .await
            {
                warn!("failed to publish PartUsageConfirmed event: {}", e);
            }
        }
        if let Err(e) = event_sender
            .send(Event::ServiceOrderConcluded(order.id))
            .await
        {
            warn!("failed to publish ServiceOrderConcluded event: {}", e);
        }

        Ok(ConcludeServiceOrderResult {
            order,
            lines: confirmed,
        })
    }
}
