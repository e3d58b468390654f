use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::PaginatedResponse;
use crate::auth::AuthenticatedUser;
use crate::commands::service_orders::{
    add_part_command::AddPartCommand, cancel_service_order_command::CancelServiceOrderCommand,
    conclude_service_order_command::ConcludeServiceOrderCommand,
    hold_service_order_command::HoldServiceOrderCommand, remove_part_command::RemovePartCommand,
    start_service_order_command::StartServiceOrderCommand,
};
use crate::entities::{part_usage_line, service_order::ServiceOrderStatus};
use crate::errors::ServiceError;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddPartRequest {
    pub part_id: Uuid,
    pub quantity: i32,
    #[schema(value_type = String, example = "79.90")]
    pub unit_price_charged: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ServiceOrderListParams {
    pub status: Option<ServiceOrderStatus>,
    pub quote_id: Option<Uuid>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Usage line enriched with its computed total.
#[derive(Debug, Serialize)]
pub struct UsageLineResponse {
    pub id: Uuid,
    pub part_id: Uuid,
    pub quantity: i32,
    pub unit_price_charged: Decimal,
    pub line_total: Decimal,
    pub stock_reduced: bool,
}

impl From<&part_usage_line::Model> for UsageLineResponse {
    fn from(line: &part_usage_line::Model) -> Self {
        Self {
            id: line.id,
            part_id: line.part_id,
            quantity: line.quantity,
            unit_price_charged: line.unit_price_charged,
            line_total: line.line_total(),
            stock_reduced: line.stock_reduced,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ServiceOrderResponse {
    #[serde(flatten)]
    pub order: crate::entities::service_order::Model,
    pub lines: Vec<UsageLineResponse>,
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let (order, lines) = state.services.service_orders.get_order(id).await?;
    Ok(Json(ServiceOrderResponse {
        order,
        lines: lines.iter().map(UsageLineResponse::from).collect(),
    }))
}

async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<ServiceOrderListParams>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20);
    let (orders, total) = state
        .services
        .service_orders
        .list_orders(params.status, params.quote_id, page, per_page)
        .await?;
    Ok(Json(PaginatedResponse::new(orders, page, per_page, total)))
}

async fn add_part(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(request): Json<AddPartRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let command = AddPartCommand {
        actor: user,
        order_id: id,
        part_id: request.part_id,
        quantity: request.quantity,
        unit_price_charged: request.unit_price_charged,
    };
    let line = state.services.service_orders.add_part(command).await?;
    Ok((StatusCode::CREATED, Json(UsageLineResponse::from(&line))))
}

async fn remove_part(
    State(state): State<AppState>,
    Path((id, part_id)): Path<(Uuid, Uuid)>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let command = RemovePartCommand {
        actor: user,
        order_id: id,
        part_id,
    };
    state.services.service_orders.remove_part(command).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn start_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let command = StartServiceOrderCommand {
        actor: user,
        order_id: id,
    };
    let order = state.services.service_orders.start(command).await?;
    Ok(Json(order))
}

async fn hold_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let command = HoldServiceOrderCommand {
        actor: user,
        order_id: id,
    };
    let order = state.services.service_orders.hold(command).await?;
    Ok(Json(order))
}

/// Concludes the order and confirms every usage line against stock, all in
/// one transaction.
async fn conclude_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let command = ConcludeServiceOrderCommand {
        actor: user,
        order_id: id,
    };
    let result = state.services.service_orders.conclude(command).await?;
    Ok(Json(ServiceOrderResponse {
        order: result.order,
        lines: result.lines.iter().map(UsageLineResponse::from).collect(),
    }))
}

async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let command = CancelServiceOrderCommand {
        actor: user,
        order_id: id,
    };
    let result = state.services.service_orders.cancel(command).await?;
    Ok(Json(ServiceOrderResponse {
        order: result.order,
        lines: result.reverted.iter().map(UsageLineResponse::from).collect(),
    }))
}

pub fn service_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id/parts", post(add_part))
        .route("/:id/parts/:part_id", delete(remove_part))
        .route("/:id/start", post(start_order))
        .route("/:id/hold", post(hold_order))
        .route("/:id/conclude", post(conclude_order))
        .route("/:id/cancel", post(cancel_order))
}
