//! Ledger invariants: the quantity/status bookkeeping on parts.

mod common;

use common::{actor, TestApp};
use rust_decimal_macros::dec;
use workshop_api::entities::part::PartStatus;
use workshop_api::entities::user::UserRole;
use workshop_api::errors::ServiceError;
use workshop_api::services::stock;

#[tokio::test]
async fn decrease_to_zero_derives_out_of_stock_and_increase_restores() {
    let app = TestApp::new().await;
    let part = app.create_part(3, dec!(10.00)).await;
    assert_eq!(part.status, PartStatus::Available);

    let part = stock::decrease(app.db().as_ref(), part.id, 3)
        .await
        .expect("decrease");
    assert_eq!(part.quantity_in_stock, 0);
    assert_eq!(part.status, PartStatus::OutOfStock);

    let part = stock::increase(app.db().as_ref(), part.id, 5)
        .await
        .expect("increase");
    assert_eq!(part.quantity_in_stock, 5);
    assert_eq!(part.status, PartStatus::Available);
}

#[tokio::test]
async fn decrease_beyond_stock_fails_and_leaves_quantity_untouched() {
    let app = TestApp::new().await;
    let part = app.create_part(5, dec!(10.00)).await;

    // the advisory check and the authoritative decrement must agree
    let verdict = stock::check_availability(&part, 10);
    match verdict {
        Err(ServiceError::InsufficientStock(msg)) => {
            assert!(msg.contains("requested 10"), "got: {}", msg);
            assert!(msg.contains("only 5"), "got: {}", msg);
        }
        other => panic!("expected InsufficientStock, got {:?}", other.err()),
    }

    let err = stock::decrease(app.db().as_ref(), part.id, 10)
        .await
        .expect_err("decrease past stock must fail");
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    let reloaded = app
        .state
        .services
        .parts
        .get_part(part.id)
        .await
        .expect("reload");
    assert_eq!(reloaded.quantity_in_stock, 5);
    assert_eq!(reloaded.status, PartStatus::Available);
}

#[tokio::test]
async fn check_availability_refuses_out_of_stock_parts() {
    let app = TestApp::new().await;
    let part = app.create_part(0, dec!(10.00)).await;
    assert_eq!(part.status, PartStatus::OutOfStock);

    let err = stock::check_availability(&part, 1).expect_err("out of stock");
    assert!(matches!(err, ServiceError::InsufficientStock(_)));
    assert!(err.to_string().contains("out of stock"));
}

#[tokio::test]
async fn discontinued_parts_keep_their_status_through_the_ledger() {
    let app = TestApp::new().await;
    let manager = app.create_user(UserRole::Manager).await;
    let part = app.create_part(4, dec!(10.00)).await;

    let part = app
        .state
        .services
        .parts
        .discontinue(&actor(&manager), part.id)
        .await
        .expect("discontinue");
    assert_eq!(part.status, PartStatus::Discontinued);

    // restocking a discontinued part must not resurface it
    let part = stock::increase(app.db().as_ref(), part.id, 10)
        .await
        .expect("increase");
    assert_eq!(part.quantity_in_stock, 14);
    assert_eq!(part.status, PartStatus::Discontinued);

    // draining it to zero must not flip it to out_of_stock either
    let part = stock::decrease(app.db().as_ref(), part.id, 14)
        .await
        .expect("decrease");
    assert_eq!(part.quantity_in_stock, 0);
    assert_eq!(part.status, PartStatus::Discontinued);
}

#[tokio::test]
async fn reactivation_re_derives_status_from_quantity() {
    let app = TestApp::new().await;
    let manager = app.create_user(UserRole::Manager).await;
    let parts = &app.state.services.parts;

    let part = app.create_part(0, dec!(10.00)).await;
    let part = parts
        .discontinue(&actor(&manager), part.id)
        .await
        .expect("discontinue");
    let part = parts
        .reactivate(&actor(&manager), part.id)
        .await
        .expect("reactivate");
    assert_eq!(part.status, PartStatus::OutOfStock);

    let stocked = app.create_part(7, dec!(10.00)).await;
    let stocked = parts
        .discontinue(&actor(&manager), stocked.id)
        .await
        .expect("discontinue");
    let stocked = parts
        .reactivate(&actor(&manager), stocked.id)
        .await
        .expect("reactivate");
    assert_eq!(stocked.status, PartStatus::Available);
}

#[tokio::test]
async fn manual_adjustments_route_through_the_ledger() {
    let app = TestApp::new().await;
    let manager = app.create_user(UserRole::Manager).await;
    let part = app.create_part(2, dec!(10.00)).await;

    let part = app
        .state
        .services
        .parts
        .adjust_stock(&actor(&manager), part.id, -2, Some("shrinkage".into()))
        .await
        .expect("adjust down");
    assert_eq!(part.quantity_in_stock, 0);
    assert_eq!(part.status, PartStatus::OutOfStock);

    let part = app
        .state
        .services
        .parts
        .adjust_stock(&actor(&manager), part.id, 8, Some("goods received".into()))
        .await
        .expect("adjust up");
    assert_eq!(part.quantity_in_stock, 8);
    assert_eq!(part.status, PartStatus::Available);

    let err = app
        .state
        .services
        .parts
        .adjust_stock(&actor(&manager), part.id, 0, None)
        .await
        .expect_err("zero adjustment");
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn customers_cannot_adjust_stock() {
    let app = TestApp::new().await;
    let customer = app.create_user(UserRole::Customer).await;
    let part = app.create_part(2, dec!(10.00)).await;

    let err = app
        .state
        .services
        .parts
        .adjust_stock(&actor(&customer), part.id, 1, None)
        .await
        .expect_err("customer adjustment");
    assert!(matches!(err, ServiceError::Forbidden(_)));
}
