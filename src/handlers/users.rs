use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use super::common::PaginatedResponse;
use crate::auth::policy::{self, Action, OwnershipCtx};
use crate::auth::AuthenticatedUser;
use crate::entities::user::UserRole;
use crate::errors::ServiceError;
use crate::services::users::{self as user_service, CreateUserInput};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UserListParams {
    /// Narrow the listing to one role (customer, mechanic, manager)
    pub role: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

async fn create_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(input): Json<CreateUserInput>,
) -> Result<impl IntoResponse, ServiceError> {
    policy::authorize(&user, Action::ManageCatalog, &OwnershipCtx::default())?;
    let created = user_service::create_user(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let found = user_service::get_user(&state.db, id).await?;
    Ok(Json(found))
}

async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<UserListParams>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let role = match params.role.as_deref() {
        Some(raw) => Some(
            UserRole::from_str(raw)
                .map_err(|_| ServiceError::ValidationError(format!("unknown role filter: {}", raw)))?,
        ),
        None => None,
    };
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20);
    let (users, total) = user_service::list_users(&state.db, role, page, per_page).await?;
    Ok(Json(PaginatedResponse::new(users, page, per_page, total)))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user))
}
