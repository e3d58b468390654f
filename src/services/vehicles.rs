use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{user, vehicle};
use crate::errors::ServiceError;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVehicleInput {
    #[validate(length(min = 7, max = 10))]
    pub license_plate: String,
    #[validate(length(min = 1, max = 50))]
    pub make: String,
    #[validate(length(min = 1, max = 50))]
    pub model: String,
    #[validate(range(min = 1900, max = 2100))]
    pub year: i32,
    #[validate(length(min = 1, max = 30))]
    pub color: String,
    pub owner_id: Uuid,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateVehicleInput {
    #[validate(length(min = 1, max = 30))]
    pub color: Option<String>,
    pub owner_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[instrument(skip(db, input), fields(license_plate = %input.license_plate))]
pub async fn create_vehicle(
    db: &DbPool,
    input: CreateVehicleInput,
) -> Result<vehicle::Model, ServiceError> {
    input.validate()?;

    user::Entity::find_by_id(input.owner_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("owner {} not found", input.owner_id)))?;

    let existing = vehicle::Entity::find()
        .filter(vehicle::Column::LicensePlate.eq(input.license_plate.clone()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(ServiceError::Conflict(format!(
            "a vehicle with plate {} is already registered",
            input.license_plate
        )));
    }

    let model = vehicle::ActiveModel {
        license_plate: Set(input.license_plate),
        make: Set(input.make),
        model: Set(input.model),
        year: Set(input.year),
        color: Set(input.color),
        owner_id: Set(input.owner_id),
        notes: Set(input.notes.unwrap_or_default()),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

pub async fn get_vehicle(db: &DbPool, id: Uuid) -> Result<vehicle::Model, ServiceError> {
    vehicle::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("vehicle {} not found", id)))
}

#[instrument(skip(db))]
pub async fn update_vehicle(
    db: &DbPool,
    id: Uuid,
    input: UpdateVehicleInput,
) -> Result<vehicle::Model, ServiceError> {
    input.validate()?;
    let vehicle = get_vehicle(db, id).await?;

    if let Some(owner_id) = input.owner_id {
        user::Entity::find_by_id(owner_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("owner {} not found", owner_id)))?;
    }

    let mut active = vehicle.into_active_model();
    if let Some(color) = input.color {
        active.color = Set(color);
    }
    if let Some(owner_id) = input.owner_id {
        active.owner_id = Set(owner_id);
    }
    if let Some(notes) = input.notes {
        active.notes = Set(notes);
    }
    Ok(active.update(db).await?)
}

#[instrument(skip(db))]
pub async fn delete_vehicle(db: &DbPool, id: Uuid) -> Result<(), ServiceError> {
    let vehicle = get_vehicle(db, id).await?;
    vehicle.delete(db).await?;
    Ok(())
}

/// Lists vehicles ordered by make/model, optionally narrowed by owner or an
/// exact plate.
#[instrument(skip(db))]
pub async fn list_vehicles(
    db: &DbPool,
    owner_id: Option<Uuid>,
    license_plate: Option<String>,
    page: u64,
    per_page: u64,
) -> Result<(Vec<vehicle::Model>, u64), ServiceError> {
    let mut query = vehicle::Entity::find()
        .order_by_asc(vehicle::Column::Make)
        .order_by_asc(vehicle::Column::Model);
    if let Some(owner_id) = owner_id {
        query = query.filter(vehicle::Column::OwnerId.eq(owner_id));
    }
    if let Some(plate) = license_plate {
        query = query.filter(vehicle::Column::LicensePlate.eq(plate));
    }

    let paginator = query.paginate(db, per_page);
    let total = paginator.num_items().await?;
    let vehicles = paginator.fetch_page(page.saturating_sub(1)).await?;
    Ok((vehicles, total))
}
