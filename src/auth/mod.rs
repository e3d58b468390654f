//! Caller identity and authorization.
//!
//! Authentication itself happens upstream: a trusted gateway terminates the
//! session and forwards the caller's identity in headers. This module only
//! extracts that identity and decides what each role may do (see [`policy`]).

pub mod policy;

use std::str::FromStr;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::UserRole;
use crate::errors::ServiceError;

pub const HEADER_USER_ID: &str = "x-user-id";
pub const HEADER_USERNAME: &str = "x-username";
pub const HEADER_USER_ROLE: &str = "x-user-role";

/// The caller, as asserted by the upstream gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn is_staff(&self) -> bool {
        matches!(self.role, UserRole::Mechanic | UserRole::Manager)
    }
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, ServiceError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServiceError::Unauthorized(format!("missing identity header {}", name)))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header_value(parts, HEADER_USER_ID)?;
        let id = Uuid::parse_str(id)
            .map_err(|_| ServiceError::Unauthorized("malformed user id header".to_string()))?;

        let username = header_value(parts, HEADER_USERNAME)?.to_string();

        let role = header_value(parts, HEADER_USER_ROLE)?;
        let role = UserRole::from_str(role).map_err(|_| {
            ServiceError::Unauthorized(format!("unknown role in identity header: {}", role))
        })?;

        Ok(AuthenticatedUser { id, username, role })
    }
}
