use lazy_static::lazy_static;
use prometheus::{IntCounterVec, Opts};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::policy::{self, Action, OwnershipCtx};
use crate::auth::AuthenticatedUser;
use crate::commands::Command;
use crate::db::DbPool;
use crate::entities::part;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::stock;

lazy_static! {
    static ref STOCK_ADJUSTMENTS: IntCounterVec = IntCounterVec::new(
        Opts::new("stock_adjustments_total", "Total manual stock adjustments"),
        &["direction"]
    )
    .expect("metric can be created");
}

/// Manual stock correction (goods received, shrinkage, recount), routed
/// through the ledger so status derivation stays consistent.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AdjustStockCommand {
    pub actor: AuthenticatedUser,
    pub part_id: Uuid,
    /// Signed delta; positive receives stock, negative removes it.
    pub adjustment: i32,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[async_trait::async_trait]
impl Command for AdjustStockCommand {
    type Result = part::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(part_id = %self.part_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        policy::authorize(&self.actor, Action::AdjustStock, &OwnershipCtx::default())?;

        if self.adjustment == 0 {
            return Err(ServiceError::ValidationError(
                "adjustment must not be zero".to_string(),
            ));
        }

        let db = db_pool.as_ref();
        let before = part::Entity::find_by_id(self.part_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("part {} not found", self.part_id)))?;

        let after = if self.adjustment > 0 {
            STOCK_ADJUSTMENTS.with_label_values(&["increase"]).inc();
            stock::increase(db, self.part_id, self.adjustment).await?
        } else {
            STOCK_ADJUSTMENTS.with_label_values(&["decrease"]).inc();
            stock::decrease(db, self.part_id, -self.adjustment).await?
        };

        info!(
            part_id = %self.part_id,
            old_quantity = before.quantity_in_stock,
            new_quantity = after.quantity_in_stock,
            reason = self.reason.as_deref().unwrap_or("unspecified"),
            "stock adjusted"
        );
        if let Err(e) = event_sender
            .send(Event::StockAdjusted {
                part_id: self.part_id,
                old_quantity: before.quantity_in_stock,
                new_quantity: after.quantity_in_stock,
            })
            .await
        {
            warn!("failed to publish StockAdjusted event: {}", e);
        }

        Ok(after)
    }
}
