//! Workshop API Library
//!
//! Backend for an auto-repair workshop: customers, vehicles, parts
//! inventory, quotes and service orders, with the quote -> service order ->
//! stock reconciliation workflow at its core.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod commands;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod openapi;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Json, Router};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::handlers::AppServices;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub event_sender: EventSender,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: config::AppConfig, event_sender: EventSender) -> Self {
        let services = AppServices::new(db.clone(), Arc::new(event_sender.clone()));
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::ApiDoc::openapi())
}

/// Assembles the full application router.
pub fn app_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/users", handlers::users::user_routes())
        .nest("/vehicles", handlers::vehicles::vehicle_routes())
        .nest("/parts", handlers::parts::part_routes())
        .nest("/quotes", handlers::quotes::quote_routes())
        .nest(
            "/service-orders",
            handlers::service_orders::service_order_routes(),
        );

    let request_timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        .nest("/api/v1", api)
        .merge(handlers::health::health_routes())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
