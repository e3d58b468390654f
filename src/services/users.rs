use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::user::{self, UserRole};
use crate::errors::ServiceError;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserInput {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[schema(value_type = String, example = "customer")]
    pub role: UserRole,
    /// CPF in the 000.000.000-00 format
    #[validate(length(min = 11, max = 14))]
    pub cpf: String,
    #[validate(length(min = 8, max = 20))]
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
}

#[instrument(skip(db, input), fields(username = %input.username))]
pub async fn create_user(db: &DbPool, input: CreateUserInput) -> Result<user::Model, ServiceError> {
    input.validate()?;

    let taken = user::Entity::find()
        .filter(user::Column::Username.eq(input.username.clone()))
        .one(db)
        .await?;
    if taken.is_some() {
        return Err(ServiceError::Conflict(format!(
            "username {} is already taken",
            input.username
        )));
    }

    let model = user::ActiveModel {
        username: Set(input.username),
        email: Set(input.email),
        role: Set(input.role),
        cpf: Set(input.cpf),
        phone: Set(input.phone),
        birth_date: Set(input.birth_date),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

pub async fn get_user(db: &DbPool, id: Uuid) -> Result<user::Model, ServiceError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("user {} not found", id)))
}

/// Lists users, optionally narrowed to a single role (e.g. all customers).
#[instrument(skip(db))]
pub async fn list_users(
    db: &DbPool,
    role: Option<UserRole>,
    page: u64,
    per_page: u64,
) -> Result<(Vec<user::Model>, u64), ServiceError> {
    let mut query = user::Entity::find().order_by_asc(user::Column::Username);
    if let Some(role) = role {
        query = query.filter(user::Column::Role.eq(role));
    }

    let paginator = query.paginate(db, per_page);
    let total = paginator.num_items().await?;
    let users = paginator.fetch_page(page.saturating_sub(1)).await?;
    Ok((users, total as u64))
}
