use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::PaginatedResponse;
use crate::auth::AuthenticatedUser;
use crate::commands::quotes::{
    approve_quote_command::ApproveQuoteCommand, create_quote_command::CreateQuoteCommand,
    generate_service_order_command::GenerateServiceOrderCommand,
    reject_quote_command::RejectQuoteCommand, update_quote_command::UpdateQuoteCommand,
};
use crate::entities::quote::QuoteStatus;
use crate::errors::ServiceError;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateQuoteRequest {
    pub vehicle_id: Uuid,
    pub mechanic_id: Uuid,
    pub problem_description: String,
    #[schema(value_type = String, example = "100.00")]
    pub labor_value: Decimal,
    #[schema(value_type = String, example = "50.00")]
    pub parts_value: Decimal,
    pub valid_until: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuoteRequest {
    pub problem_description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub labor_value: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub parts_value: Option<Decimal>,
    pub valid_until: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectQuoteRequest {
    /// At least 10 characters; lands in the quote's audit notes
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateServiceOrderRequest {
    pub start_date: DateTime<Utc>,
    pub estimated_date: NaiveDate,
    pub entry_mileage: i32,
}

#[derive(Debug, Deserialize)]
pub struct QuoteListParams {
    pub status: Option<QuoteStatus>,
    pub vehicle_id: Option<Uuid>,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

async fn create_quote(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateQuoteRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let command = CreateQuoteCommand {
        actor: user,
        vehicle_id: request.vehicle_id,
        mechanic_id: request.mechanic_id,
        problem_description: request.problem_description,
        labor_value: request.labor_value,
        parts_value: request.parts_value,
        valid_until: request.valid_until,
        notes: request.notes,
    };
    let quote = state.services.quotes.create_quote(command).await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

async fn get_quote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let quote = state.services.quotes.get_quote(&user, id).await?;
    Ok(Json(quote))
}

async fn update_quote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(request): Json<UpdateQuoteRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let command = UpdateQuoteCommand {
        actor: user,
        quote_id: id,
        problem_description: request.problem_description,
        labor_value: request.labor_value,
        parts_value: request.parts_value,
        valid_until: request.valid_until,
    };
    let quote = state.services.quotes.update_quote(command).await?;
    Ok(Json(quote))
}

async fn list_quotes(
    State(state): State<AppState>,
    Query(params): Query<QuoteListParams>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20);
    let (quotes, total) = state
        .services
        .quotes
        .list_quotes(
            &user,
            params.status,
            params.vehicle_id,
            params.created_from,
            params.created_to,
            page,
            per_page,
        )
        .await?;
    Ok(Json(PaginatedResponse::new(quotes, page, per_page, total)))
}

/// Customer acceptance; only the vehicle's owner may call this.
async fn approve_quote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let command = ApproveQuoteCommand {
        actor: user,
        quote_id: id,
    };
    let quote = state.services.quotes.approve_quote(command).await?;
    Ok(Json(quote))
}

async fn reject_quote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(request): Json<RejectQuoteRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let command = RejectQuoteCommand {
        actor: user,
        quote_id: id,
        reason: request.reason,
    };
    let quote = state.services.quotes.reject_quote(command).await?;
    Ok(Json(quote))
}

async fn generate_service_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(request): Json<GenerateServiceOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let command = GenerateServiceOrderCommand {
        actor: user,
        quote_id: id,
        start_date: request.start_date,
        estimated_date: request.estimated_date,
        entry_mileage: request.entry_mileage,
    };
    let order = state
        .services
        .quotes
        .generate_service_order(command)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub fn quote_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_quotes).post(create_quote))
        .route("/:id", get(get_quote).put(update_quote))
        .route("/:id/approve", post(approve_quote))
        .route("/:id/reject", post(reject_quote))
        .route("/:id/service-order", post(generate_service_order))
}
