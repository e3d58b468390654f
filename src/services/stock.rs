//! The stock ledger: the only code allowed to move `quantity_in_stock`.
//!
//! Every primitive takes a `ConnectionTrait` so callers can run it either on
//! the pool directly or inside the transaction of a larger operation. The
//! decrement is a single conditional UPDATE, so the database row lock is the
//! authoritative check; a read-then-write of a cached quantity is never
//! trusted.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter, Set,
};
use tracing::instrument;
use uuid::Uuid;

use crate::entities::part::{self, PartStatus};
use crate::entities::part_usage_line;
use crate::errors::ServiceError;

/// Returns `Err(InsufficientStock)` naming the shortfall when the part
/// cannot cover `requested` units. The answer is advisory: the decrement
/// re-checks atomically, so a pass here can still lose a race.
pub fn check_availability(part: &part::Model, requested: i32) -> Result<(), ServiceError> {
    if part.status == PartStatus::OutOfStock {
        return Err(ServiceError::InsufficientStock(format!(
            "part {} ({}) is out of stock",
            part.code, part.name
        )));
    }
    if requested > part.quantity_in_stock {
        return Err(ServiceError::InsufficientStock(format!(
            "part {} ({}): requested {}, only {} in stock",
            part.code, part.name, requested, part.quantity_in_stock
        )));
    }
    Ok(())
}

/// Atomically subtracts `qty` from the part's stock.
///
/// The UPDATE only matches when enough stock remains, so the quantity can
/// never go negative regardless of how many callers race on the same row.
/// Hitting zero from `available` derives `out_of_stock` in the same
/// connection. Returns the part as persisted.
#[instrument(skip(db))]
pub async fn decrease<C: ConnectionTrait>(
    db: &C,
    part_id: Uuid,
    qty: i32,
) -> Result<part::Model, ServiceError> {
    let result = part::Entity::update_many()
        .col_expr(
            part::Column::QuantityInStock,
            Expr::col(part::Column::QuantityInStock).sub(qty),
        )
        .filter(part::Column::Id.eq(part_id))
        .filter(part::Column::QuantityInStock.gte(qty))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        // Either the part vanished or the conditional guard rejected us;
        // reload to tell the two apart and name the shortfall.
        let part = part::Entity::find_by_id(part_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("part {} not found", part_id)))?;
        return Err(ServiceError::InsufficientStock(format!(
            "part {} ({}): requested {}, only {} in stock",
            part.code, part.name, qty, part.quantity_in_stock
        )));
    }

    let part = reload(db, part_id).await?;
    if part.quantity_in_stock == 0 && part.status == PartStatus::Available {
        let mut active = part.into_active_model();
        active.status = Set(PartStatus::OutOfStock);
        let part = active.update(db).await?;
        return Ok(part);
    }
    Ok(part)
}

/// Atomically adds `qty` to the part's stock, resurfacing an `out_of_stock`
/// part as `available`. Discontinued parts keep their status.
#[instrument(skip(db))]
pub async fn increase<C: ConnectionTrait>(
    db: &C,
    part_id: Uuid,
    qty: i32,
) -> Result<part::Model, ServiceError> {
    let result = part::Entity::update_many()
        .col_expr(
            part::Column::QuantityInStock,
            Expr::col(part::Column::QuantityInStock).add(qty),
        )
        .filter(part::Column::Id.eq(part_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(ServiceError::ConsistencyError(format!(
            "part {} disappeared while returning stock",
            part_id
        )));
    }

    let part = reload(db, part_id).await?;
    if part.status == PartStatus::OutOfStock && part.quantity_in_stock > 0 {
        let mut active = part.into_active_model();
        active.status = Set(PartStatus::Available);
        let part = active.update(db).await?;
        return Ok(part);
    }
    Ok(part)
}

/// Applies a usage line's decrement exactly once.
///
/// Returns `Ok(None)` when the line was already confirmed (nothing to do),
/// or the updated line after a successful decrement. A failed decrement
/// propagates so the surrounding transaction rolls back.
pub async fn confirm_line_usage<C: ConnectionTrait>(
    db: &C,
    line: &part_usage_line::Model,
) -> Result<Option<part_usage_line::Model>, ServiceError> {
    if line.stock_reduced {
        return Ok(None);
    }
    decrease(db, line.part_id, line.quantity).await?;

    let mut active = line.clone().into_active_model();
    active.stock_reduced = Set(true);
    let updated = active.update(db).await?;
    Ok(Some(updated))
}

/// Reverses a usage line's decrement exactly once; the mirror image of
/// [`confirm_line_usage`].
pub async fn revert_line_usage<C: ConnectionTrait>(
    db: &C,
    line: &part_usage_line::Model,
) -> Result<Option<part_usage_line::Model>, ServiceError> {
    if !line.stock_reduced {
        return Ok(None);
    }
    increase(db, line.part_id, line.quantity).await?;

    let mut active = line.clone().into_active_model();
    active.stock_reduced = Set(false);
    let updated = active.update(db).await?;
    Ok(Some(updated))
}

async fn reload<C: ConnectionTrait>(db: &C, part_id: Uuid) -> Result<part::Model, ServiceError> {
    part::Entity::find_by_id(part_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::ConsistencyError(format!(
                "part {} disappeared during a stock mutation",
                part_id
            ))
        })
}
