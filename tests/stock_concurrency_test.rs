//! Two service orders racing for the last unit of the same part: the
//! conditional decrement in the ledger, not the advisory pre-check, decides
//! the winner.

mod common;

use common::{actor, TestApp};
use rust_decimal_macros::dec;
use workshop_api::commands::service_orders::conclude_service_order_command::ConcludeServiceOrderCommand;
use workshop_api::entities::service_order::ServiceOrderStatus;
use workshop_api::errors::ServiceError;

#[tokio::test]
async fn concurrent_conclusions_never_oversell_the_last_unit() {
    let app = TestApp::new().await;
    let part = app.create_part(1, dec!(60.00)).await;

    let (mechanic_a, order_a) = app.in_progress_order().await;
    let (mechanic_b, order_b) = app.in_progress_order().await;
    // both lines passed the advisory availability check at add time
    app.add_part_line(&mechanic_a, &order_a, &part, 1).await;
    app.add_part_line(&mechanic_b, &order_b, &part, 1).await;

    let svc = app.state.services.service_orders.clone();
    let task_a = {
        let svc = svc.clone();
        let cmd = ConcludeServiceOrderCommand {
            actor: actor(&mechanic_a),
            order_id: order_a.id,
        };
        tokio::spawn(async move { svc.conclude(cmd).await })
    };
    let task_b = {
        let svc = svc.clone();
        let cmd = ConcludeServiceOrderCommand {
            actor: actor(&mechanic_b),
            order_id: order_b.id,
        };
        tokio::spawn(async move { svc.conclude(cmd).await })
    };

    let result_a = task_a.await.expect("join a");
    let result_b = task_b.await.expect("join b");

    let successes = [result_a.is_ok(), result_b.is_ok()]
        .iter()
        .filter(|ok| **ok)
        .count();
    assert_eq!(successes, 1, "exactly one conclusion may win the last unit");

    let loser_err = if result_a.is_err() {
        result_a.err().unwrap()
    } else {
        result_b.err().unwrap()
    };
    assert!(
        matches!(loser_err, ServiceError::InsufficientStock(_)),
        "loser must see the stock error, got: {}",
        loser_err
    );

    let part = app
        .state
        .services
        .parts
        .get_part(part.id)
        .await
        .expect("reload");
    assert_eq!(part.quantity_in_stock, 0, "stock never goes negative");

    // the losing order is fully rolled back and can retry later
    let (a, a_lines) = app
        .state
        .services
        .service_orders
        .get_order(order_a.id)
        .await
        .expect("order a");
    let (b, b_lines) = app
        .state
        .services
        .service_orders
        .get_order(order_b.id)
        .await
        .expect("order b");
    let (winner, winner_lines, loser, loser_lines) = if a.status == ServiceOrderStatus::Concluded {
        (a, a_lines, b, b_lines)
    } else {
        (b, b_lines, a, a_lines)
    };
    assert_eq!(winner.status, ServiceOrderStatus::Concluded);
    assert!(winner_lines.iter().all(|l| l.stock_reduced));
    assert_eq!(loser.status, ServiceOrderStatus::InProgress);
    assert!(loser.completion_date.is_none());
    assert!(loser_lines.iter().all(|l| !l.stock_reduced));
}
