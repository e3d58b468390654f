use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::common::PaginatedResponse;
use crate::auth::policy::{self, Action, OwnershipCtx};
use crate::auth::AuthenticatedUser;
use crate::errors::ServiceError;
use crate::services::vehicles::{self as vehicle_service, CreateVehicleInput, UpdateVehicleInput};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct VehicleListParams {
    pub owner_id: Option<Uuid>,
    pub license_plate: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

async fn create_vehicle(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(input): Json<CreateVehicleInput>,
) -> Result<impl IntoResponse, ServiceError> {
    policy::authorize(&user, Action::ManageCatalog, &OwnershipCtx::default())?;
    let created = vehicle_service::create_vehicle(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let vehicle = vehicle_service::get_vehicle(&state.db, id).await?;
    Ok(Json(vehicle))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(input): Json<UpdateVehicleInput>,
) -> Result<impl IntoResponse, ServiceError> {
    policy::authorize(&user, Action::ManageCatalog, &OwnershipCtx::default())?;
    let updated = vehicle_service::update_vehicle(&state.db, id, input).await?;
    Ok(Json(updated))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    policy::authorize(&user, Action::ManageCatalog, &OwnershipCtx::default())?;
    vehicle_service::delete_vehicle(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_vehicles(
    State(state): State<AppState>,
    Query(params): Query<VehicleListParams>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20);
    let (vehicles, total) = vehicle_service::list_vehicles(
        &state.db,
        params.owner_id,
        params.license_plate,
        page,
        per_page,
    )
    .await?;
    Ok(Json(PaginatedResponse::new(vehicles, page, per_page, total)))
}

pub fn vehicle_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route(
            "/:id",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
}
