use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::PaginatedResponse;
use crate::auth::AuthenticatedUser;
use crate::entities::part::PartStatus;
use crate::errors::ServiceError;
use crate::services::parts::{CreatePartInput, UpdatePartInput};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PartListParams {
    pub manufacturer: Option<String>,
    pub status: Option<PartStatus>,
    /// true: only parts at or below their minimum stock; false: only above
    pub below_minimum: Option<bool>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustStockRequest {
    /// Signed delta; positive receives stock, negative removes it
    pub adjustment: i32,
    pub reason: Option<String>,
}

async fn create_part(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(input): Json<CreatePartInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.parts.create_part(&user, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_part(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let part = state.services.parts.get_part(id).await?;
    Ok(Json(part))
}

async fn update_part(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(input): Json<UpdatePartInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state.services.parts.update_part(&user, id, input).await?;
    Ok(Json(updated))
}

async fn list_parts(
    State(state): State<AppState>,
    Query(params): Query<PartListParams>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20);
    let (parts, total) = state
        .services
        .parts
        .list_parts(
            params.manufacturer,
            params.status,
            params.below_minimum,
            page,
            per_page,
        )
        .await?;
    Ok(Json(PaginatedResponse::new(parts, page, per_page, total)))
}

/// Read-only probe: would the ledger satisfy this quantity right now?
async fn check_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<AvailabilityParams>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state
        .services
        .parts
        .check_availability(id, params.quantity)
        .await?;
    Ok(Json(report))
}

async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(request): Json<AdjustStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let part = state
        .services
        .parts
        .adjust_stock(&user, id, request.adjustment, request.reason)
        .await?;
    Ok(Json(part))
}

async fn discontinue_part(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let part = state.services.parts.discontinue(&user, id).await?;
    Ok(Json(part))
}

async fn reactivate_part(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let part = state.services.parts.reactivate(&user, id).await?;
    Ok(Json(part))
}

pub fn part_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_parts).post(create_part))
        .route("/:id", get(get_part).put(update_part))
        .route("/:id/check-availability", get(check_availability))
        .route("/:id/adjust-stock", post(adjust_stock))
        .route("/:id/discontinue", post(discontinue_part))
        .route("/:id/reactivate", post(reactivate_part))
}
