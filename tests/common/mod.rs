//! Test harness backed by a file-based SQLite database with a
//! single-connection pool, so every test runs against real migrations.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use workshop_api::auth::{self, AuthenticatedUser};
use workshop_api::commands::quotes::approve_quote_command::ApproveQuoteCommand;
use workshop_api::commands::quotes::create_quote_command::CreateQuoteCommand;
use workshop_api::commands::quotes::generate_service_order_command::GenerateServiceOrderCommand;
use workshop_api::commands::service_orders::add_part_command::AddPartCommand;
use workshop_api::commands::service_orders::start_service_order_command::StartServiceOrderCommand;
use workshop_api::config::AppConfig;
use workshop_api::db;
use workshop_api::entities::user::UserRole;
use workshop_api::entities::{part, quote, service_order, user, vehicle};
use workshop_api::events::{self, EventSender};
use workshop_api::services::parts::CreatePartInput;
use workshop_api::services::users::CreateUserInput;
use workshop_api::services::vehicles::CreateVehicleInput;
use workshop_api::AppState;

pub struct TestApp {
    pub state: AppState,
    router: Router,
    _tmp: tempfile::TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let tmp = tempfile::tempdir().expect("tempdir");
        let db_path = tmp.path().join("workshop_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("db connect");
        db::run_migrations(&pool).await.expect("migrations");

        let (tx, rx) = mpsc::channel(256);
        let sender = EventSender::new(tx);
        let event_task = tokio::spawn(events::process_events(rx));

        let state = AppState::new(Arc::new(pool), cfg, sender);
        let router = workshop_api::app_router(state.clone());
        Self {
            state,
            router,
            _tmp: tmp,
            _event_task: event_task,
        }
    }

    pub fn db(&self) -> Arc<db::DbPool> {
        self.state.db.clone()
    }

    /// Fires one request at the router, optionally carrying the identity
    /// headers the upstream gateway would set.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        caller: Option<&AuthenticatedUser>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(caller) = caller {
            builder = builder
                .header(auth::HEADER_USER_ID, caller.id.to_string())
                .header(auth::HEADER_USERNAME, caller.username.clone())
                .header(auth::HEADER_USER_ROLE, caller.role.to_string());
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };
        self.router.clone().oneshot(request).await.expect("response")
    }

    pub async fn request_as(
        &self,
        caller: &user::Model,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        self.request(method, uri, body, Some(&actor(caller))).await
    }

    pub async fn create_user(&self, role: UserRole) -> user::Model {
        let suffix = Uuid::new_v4().simple().to_string();
        workshop_api::services::users::create_user(
            &self.state.db,
            CreateUserInput {
                username: format!("user-{}", &suffix[..12]),
                email: format!("{}@example.com", &suffix[..12]),
                role,
                cpf: suffix[..11].to_string(),
                phone: "11 99999-0000".to_string(),
                birth_date: None,
            },
        )
        .await
        .expect("create user")
    }

    pub async fn create_vehicle(&self, owner: &user::Model) -> vehicle::Model {
        let suffix = Uuid::new_v4().simple().to_string().to_uppercase();
        workshop_api::services::vehicles::create_vehicle(
            &self.state.db,
            CreateVehicleInput {
                license_plate: format!("AB{}", &suffix[..5]),
                make: "Toyota".to_string(),
                model: "Corolla".to_string(),
                year: 2020,
                color: "silver".to_string(),
                owner_id: owner.id,
                notes: None,
            },
        )
        .await
        .expect("create vehicle")
    }

    pub async fn create_part(&self, stock: i32, unit_price: Decimal) -> part::Model {
        let manager = self.create_user(UserRole::Manager).await;
        let suffix = Uuid::new_v4().simple().to_string().to_uppercase();
        self.state
            .services
            .parts
            .create_part(
                &actor(&manager),
                CreatePartInput {
                    code: format!("P-{}", &suffix[..8]),
                    name: "Oil filter".to_string(),
                    description: None,
                    manufacturer: "Bosch".to_string(),
                    quantity_in_stock: stock,
                    minimum_stock: Some(2),
                    unit_price,
                },
            )
            .await
            .expect("create part")
    }

    pub async fn create_quote(
        &self,
        vehicle: &vehicle::Model,
        mechanic: &user::Model,
    ) -> quote::Model {
        self.state
            .services
            .quotes
            .create_quote(CreateQuoteCommand {
                actor: actor(mechanic),
                vehicle_id: vehicle.id,
                mechanic_id: mechanic.id,
                problem_description: "engine makes a rattling noise".to_string(),
                labor_value: dec!(100.00),
                parts_value: dec!(50.00),
                valid_until: Utc::now().date_naive() + Duration::days(30),
                notes: None,
            })
            .await
            .expect("create quote")
    }

    /// Seeds customer + vehicle + mechanic + approved quote in one go.
    pub async fn approved_quote(&self) -> (user::Model, user::Model, quote::Model) {
        let customer = self.create_user(UserRole::Customer).await;
        let mechanic = self.create_user(UserRole::Mechanic).await;
        let vehicle = self.create_vehicle(&customer).await;
        let quote = self.create_quote(&vehicle, &mechanic).await;
        let quote = self
            .state
            .services
            .quotes
            .approve_quote(ApproveQuoteCommand {
                actor: actor(&customer),
                quote_id: quote.id,
            })
            .await
            .expect("approve quote");
        (customer, mechanic, quote)
    }

    pub async fn generate_order(
        &self,
        quote: &quote::Model,
        mechanic: &user::Model,
    ) -> service_order::Model {
        self.state
            .services
            .quotes
            .generate_service_order(GenerateServiceOrderCommand {
                actor: actor(mechanic),
                quote_id: quote.id,
                start_date: Utc::now() - Duration::hours(1),
                estimated_date: Utc::now().date_naive() + Duration::days(7),
                entry_mileage: 45_000,
            })
            .await
            .expect("generate service order")
    }

    /// Approved quote turned into an in-progress order, ready for parts.
    pub async fn in_progress_order(&self) -> (user::Model, service_order::Model) {
        let (_, mechanic, quote) = self.approved_quote().await;
        let order = self.generate_order(&quote, &mechanic).await;
        let order = self
            .state
            .services
            .service_orders
            .start(StartServiceOrderCommand {
                actor: actor(&mechanic),
                order_id: order.id,
            })
            .await
            .expect("start order");
        (mechanic, order)
    }

    pub async fn add_part_line(
        &self,
        mechanic: &user::Model,
        order: &service_order::Model,
        part: &part::Model,
        quantity: i32,
    ) -> workshop_api::entities::part_usage_line::Model {
        self.state
            .services
            .service_orders
            .add_part(AddPartCommand {
                actor: actor(mechanic),
                order_id: order.id,
                part_id: part.id,
                quantity,
                unit_price_charged: part.unit_price,
            })
            .await
            .expect("add part")
    }
}

pub fn actor(user: &user::Model) -> AuthenticatedUser {
    AuthenticatedUser {
        id: user.id,
        username: user.username.clone(),
        role: user.role,
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}
