//! End-to-end HTTP coverage: the full quote -> service order -> stock flow
//! driven through the router with gateway identity headers.

mod common;

use std::str::FromStr;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{body_json, TestApp};
use rust_decimal::Decimal;
use serde_json::json;
use workshop_api::entities::user::UserRole;

fn decimal_field(value: &serde_json::Value) -> Decimal {
    match value {
        serde_json::Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("not a decimal value: {:?}", other),
    }
}

#[tokio::test]
async fn health_answers_without_identity() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn protected_routes_require_identity_headers() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/api/v1/parts", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .contains("identity header"));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["info"]["title"], "Workshop API");
}

#[tokio::test]
async fn full_workflow_over_http() {
    let app = TestApp::new().await;
    let manager = app.create_user(UserRole::Manager).await;
    let mechanic = app.create_user(UserRole::Mechanic).await;
    let customer = app.create_user(UserRole::Customer).await;

    // catalog setup: a vehicle for the customer and a part in stock
    let response = app
        .request_as(
            &manager,
            Method::POST,
            "/api/v1/vehicles",
            Some(json!({
                "license_plate": "XYZ-9876",
                "make": "Fiat",
                "model": "Uno",
                "year": 2015,
                "color": "red",
                "owner_id": customer.id,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let vehicle = body_json(response).await;

    let response = app
        .request_as(
            &manager,
            Method::POST,
            "/api/v1/parts",
            Some(json!({
                "code": "FLT-001",
                "name": "Oil filter",
                "manufacturer": "Bosch",
                "quantity_in_stock": 4,
                "unit_price": "35.90",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let part = body_json(response).await;
    assert_eq!(part["status"], "available");

    // the mechanic quotes the job
    let response = app
        .request_as(
            &mechanic,
            Method::POST,
            "/api/v1/quotes",
            Some(json!({
                "vehicle_id": vehicle["id"],
                "mechanic_id": mechanic.id,
                "problem_description": "oil leak under the engine",
                "labor_value": "100.00",
                "parts_value": "50.00",
                "valid_until": (Utc::now().date_naive() + Duration::days(30)).to_string(),
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let quote = body_json(response).await;
    assert_eq!(quote["status"], "pending");
    assert_eq!(decimal_field(&quote["total_value"]), Decimal::new(15000, 2));
    let quote_id = quote["id"].as_str().expect("quote id").to_string();

    // staff cannot decide the quote; the owning customer can
    let response = app
        .request_as(
            &mechanic,
            Method::POST,
            &format!("/api/v1/quotes/{}/approve", quote_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request_as(
            &customer,
            Method::POST,
            &format!("/api/v1/quotes/{}/approve", quote_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let quote = body_json(response).await;
    assert_eq!(quote["status"], "approved");

    // approved quote becomes a service order
    let response = app
        .request_as(
            &mechanic,
            Method::POST,
            &format!("/api/v1/quotes/{}/service-order", quote_id),
            Some(json!({
                "start_date": Utc::now().to_rfc3339(),
                "estimated_date": (Utc::now().date_naive() + Duration::days(5)).to_string(),
                "entry_mileage": 88_000,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = body_json(response).await;
    assert_eq!(order["status"], "awaiting");
    let order_id = order["id"].as_str().expect("order id").to_string();

    let response = app
        .request_as(
            &mechanic,
            Method::POST,
            &format!("/api/v1/service-orders/{}/start", order_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // over-asking is refused with the ledger's reason
    let response = app
        .request_as(
            &mechanic,
            Method::POST,
            &format!("/api/v1/service-orders/{}/parts", order_id),
            Some(json!({
                "part_id": part["id"],
                "quantity": 10,
                "unit_price_charged": "35.90",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .contains("only 4 in stock"));

    let response = app
        .request_as(
            &mechanic,
            Method::POST,
            &format!("/api/v1/service-orders/{}/parts", order_id),
            Some(json!({
                "part_id": part["id"],
                "quantity": 3,
                "unit_price_charged": "35.90",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let line = body_json(response).await;
    assert_eq!(line["stock_reduced"], false);
    assert_eq!(decimal_field(&line["line_total"]), Decimal::new(10770, 2));

    // customers cannot conclude
    let response = app
        .request_as(
            &customer,
            Method::POST,
            &format!("/api/v1/service-orders/{}/conclude", order_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request_as(
            &mechanic,
            Method::POST,
            &format!("/api/v1/service-orders/{}/conclude", order_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let concluded = body_json(response).await;
    assert_eq!(concluded["status"], "concluded");
    assert_eq!(concluded["lines"][0]["stock_reduced"], true);

    // the conclusion consumed the stock
    let response = app
        .request_as(
            &mechanic,
            Method::GET,
            &format!("/api/v1/parts/{}", part["id"].as_str().unwrap()),
            None,
        )
        .await;
    let part = body_json(response).await;
    assert_eq!(part["quantity_in_stock"], 1);

    // and the order shows up with its lines embedded
    let response = app
        .request_as(
            &manager,
            Method::GET,
            &format!("/api/v1/service-orders/{}", order_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["status"], "concluded");
    assert_eq!(fetched["lines"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn availability_probe_reports_the_shortfall() {
    let app = TestApp::new().await;
    let mechanic = app.create_user(UserRole::Mechanic).await;
    let part = app.create_part(5, Decimal::new(1000, 2)).await;

    let response = app
        .request_as(
            &mechanic,
            Method::GET,
            &format!("/api/v1/parts/{}/check-availability?quantity=10", part.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["sufficient"], false);
    assert_eq!(report["available_quantity"], 5);
    assert_eq!(report["requested_quantity"], 10);
    assert!(report["reason"]
        .as_str()
        .unwrap_or_default()
        .contains("only 5 in stock"));

    let response = app
        .request_as(
            &mechanic,
            Method::GET,
            &format!("/api/v1/parts/{}/check-availability?quantity=5", part.id),
            None,
        )
        .await;
    let report = body_json(response).await;
    assert_eq!(report["sufficient"], true);
    assert!(report["reason"].is_null());
}

#[tokio::test]
async fn quote_listing_is_scoped_to_the_caller() {
    let app = TestApp::new().await;
    let customer = app.create_user(UserRole::Customer).await;
    let outsider = app.create_user(UserRole::Customer).await;
    let mechanic = app.create_user(UserRole::Mechanic).await;
    let vehicle = app.create_vehicle(&customer).await;
    app.create_quote(&vehicle, &mechanic).await;

    let response = app
        .request_as(&customer, Method::GET, "/api/v1/quotes", None)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["pagination"]["total"], 1);

    let response = app
        .request_as(&outsider, Method::GET, "/api/v1/quotes", None)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["pagination"]["total"], 0);
}
