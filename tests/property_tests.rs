//! Property-based coverage for the pure pieces of the domain: the
//! availability check, derived line totals, and the policy table.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use workshop_api::auth::policy::{authorize, Action, OwnershipCtx};
use workshop_api::auth::AuthenticatedUser;
use workshop_api::entities::part::{self, PartStatus};
use workshop_api::entities::part_usage_line;
use workshop_api::entities::user::UserRole;
use workshop_api::services::stock;

fn part_with(quantity: i32, status: PartStatus) -> part::Model {
    part::Model {
        id: Uuid::new_v4(),
        code: "P-TEST".to_string(),
        name: "test part".to_string(),
        description: String::new(),
        manufacturer: "Acme".to_string(),
        quantity_in_stock: quantity,
        minimum_stock: 5,
        unit_price: Decimal::new(1000, 2),
        status,
        created_at: Utc::now(),
        updated_at: None,
    }
}

proptest! {
    /// The advisory check answers yes exactly when the stock covers the
    /// request and the part is not flagged out of stock.
    #[test]
    fn availability_agrees_with_the_quantities(
        quantity in 0i32..10_000,
        requested in 1i32..10_000,
    ) {
        let part = part_with(quantity, PartStatus::Available);
        let verdict = stock::check_availability(&part, requested);
        prop_assert_eq!(verdict.is_ok(), requested <= quantity);
    }

    /// An out-of-stock part never passes, whatever the numbers say.
    #[test]
    fn out_of_stock_always_refuses(requested in 1i32..10_000) {
        let part = part_with(0, PartStatus::OutOfStock);
        prop_assert!(stock::check_availability(&part, requested).is_err());
    }

    /// line_total is exactly quantity times the charged price, computed in
    /// fixed-point arithmetic.
    #[test]
    fn line_total_is_exact(
        quantity in 1i32..1_000,
        cents in 0i64..10_000_000,
    ) {
        let price = Decimal::new(cents, 2);
        let line = part_usage_line::Model {
            id: Uuid::new_v4(),
            service_order_id: Uuid::new_v4(),
            part_id: Uuid::new_v4(),
            quantity,
            unit_price_charged: price,
            stock_reduced: false,
            created_at: Utc::now(),
        };
        prop_assert_eq!(line.line_total(), Decimal::from(quantity) * price);
    }

    /// Quote money is a plain fixed-point sum; no rounding drift for any
    /// cent-denominated inputs.
    #[test]
    fn totals_add_without_drift(
        labor_cents in 0i64..100_000_000,
        parts_cents in 0i64..100_000_000,
    ) {
        let labor = Decimal::new(labor_cents, 2);
        let parts = Decimal::new(parts_cents, 2);
        let total = labor + parts;
        prop_assert_eq!(total - parts, labor);
        prop_assert_eq!(total.scale() <= 2, true);
    }

    /// Customers hold no grant for any staff-side action, no matter whose
    /// vehicle or assignment is in context.
    #[test]
    fn customers_never_reach_staff_actions(seed in any::<u64>()) {
        let id = Uuid::from_u64_pair(seed, seed.rotate_left(17));
        let customer = AuthenticatedUser {
            id,
            username: "prop-customer".to_string(),
            role: UserRole::Customer,
        };
        let ctx = OwnershipCtx {
            vehicle_owner: Some(id),
            assigned_mechanic: Some(id),
        };
        for action in [
            Action::CreateQuote,
            Action::UpdateQuote,
            Action::GenerateServiceOrder,
            Action::AddPart,
            Action::RemovePart,
            Action::StartServiceOrder,
            Action::HoldServiceOrder,
            Action::ConcludeServiceOrder,
            Action::CancelServiceOrder,
            Action::AdjustStock,
            Action::ManageCatalog,
        ] {
            prop_assert!(authorize(&customer, action, &ctx).is_err());
        }
    }

    /// Staff never decide quotes, even for their own vehicles.
    #[test]
    fn staff_never_decide_quotes(seed in any::<u64>()) {
        let id = Uuid::from_u64_pair(seed, seed.rotate_left(31));
        for role in [UserRole::Mechanic, UserRole::Manager] {
            let staff = AuthenticatedUser {
                id,
                username: "prop-staff".to_string(),
                role,
            };
            let ctx = OwnershipCtx {
                vehicle_owner: Some(id),
                assigned_mechanic: Some(id),
            };
            prop_assert!(authorize(&staff, Action::ApproveQuote, &ctx).is_err());
            prop_assert!(authorize(&staff, Action::RejectQuote, &ctx).is_err());
        }
    }
}
