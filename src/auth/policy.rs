//! Central authorization policy.
//!
//! Every workflow action consults this table before the domain method runs.
//! A rule grants an action to a role, optionally narrowed by an ownership
//! predicate (the quote's vehicle owner, or the assigned mechanic).

use uuid::Uuid;

use crate::entities::user::UserRole;
use crate::errors::ServiceError;

use super::AuthenticatedUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    CreateQuote,
    UpdateQuote,
    ApproveQuote,
    RejectQuote,
    GenerateServiceOrder,
    AddPart,
    RemovePart,
    StartServiceOrder,
    HoldServiceOrder,
    ConcludeServiceOrder,
    CancelServiceOrder,
    AdjustStock,
    ManageCatalog,
}

/// How a rule is narrowed beyond the role match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Any caller with the role.
    Any,
    /// Only the owner of the vehicle the quote refers to.
    VehicleOwner,
    /// Only the mechanic assigned to the quote.
    AssignedMechanic,
}

struct Rule {
    role: UserRole,
    action: Action,
    scope: Scope,
}

const fn rule(role: UserRole, action: Action, scope: Scope) -> Rule {
    Rule { role, action, scope }
}

/// The one place that says who may do what.
static POLICY: &[Rule] = &[
    // Customers decide the fate of quotes on their own vehicles, nothing else.
    rule(UserRole::Customer, Action::ApproveQuote, Scope::VehicleOwner),
    rule(UserRole::Customer, Action::RejectQuote, Scope::VehicleOwner),
    // Mechanics run the floor; generating an order stays with the assignee.
    rule(UserRole::Mechanic, Action::CreateQuote, Scope::Any),
    rule(UserRole::Mechanic, Action::UpdateQuote, Scope::AssignedMechanic),
    rule(
        UserRole::Mechanic,
        Action::GenerateServiceOrder,
        Scope::AssignedMechanic,
    ),
    rule(UserRole::Mechanic, Action::AddPart, Scope::Any),
    rule(UserRole::Mechanic, Action::RemovePart, Scope::Any),
    rule(UserRole::Mechanic, Action::StartServiceOrder, Scope::Any),
    rule(UserRole::Mechanic, Action::HoldServiceOrder, Scope::Any),
    rule(UserRole::Mechanic, Action::ConcludeServiceOrder, Scope::Any),
    rule(UserRole::Mechanic, Action::CancelServiceOrder, Scope::Any),
    rule(UserRole::Mechanic, Action::AdjustStock, Scope::Any),
    rule(UserRole::Mechanic, Action::ManageCatalog, Scope::Any),
    // Managers can do everything staff-side without ownership restrictions.
    rule(UserRole::Manager, Action::CreateQuote, Scope::Any),
    rule(UserRole::Manager, Action::UpdateQuote, Scope::Any),
    rule(UserRole::Manager, Action::GenerateServiceOrder, Scope::Any),
    rule(UserRole::Manager, Action::AddPart, Scope::Any),
    rule(UserRole::Manager, Action::RemovePart, Scope::Any),
    rule(UserRole::Manager, Action::StartServiceOrder, Scope::Any),
    rule(UserRole::Manager, Action::HoldServiceOrder, Scope::Any),
    rule(UserRole::Manager, Action::ConcludeServiceOrder, Scope::Any),
    rule(UserRole::Manager, Action::CancelServiceOrder, Scope::Any),
    rule(UserRole::Manager, Action::AdjustStock, Scope::Any),
    rule(UserRole::Manager, Action::ManageCatalog, Scope::Any),
];

/// Ownership facts the scope predicates are evaluated against.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnershipCtx {
    pub vehicle_owner: Option<Uuid>,
    pub assigned_mechanic: Option<Uuid>,
}

impl OwnershipCtx {
    pub fn vehicle_owner(owner: Uuid) -> Self {
        Self {
            vehicle_owner: Some(owner),
            ..Self::default()
        }
    }

    pub fn quote(owner: Uuid, mechanic: Uuid) -> Self {
        Self {
            vehicle_owner: Some(owner),
            assigned_mechanic: Some(mechanic),
        }
    }
}

fn scope_matches(scope: Scope, user: &AuthenticatedUser, ctx: &OwnershipCtx) -> bool {
    match scope {
        Scope::Any => true,
        Scope::VehicleOwner => ctx.vehicle_owner == Some(user.id),
        Scope::AssignedMechanic => ctx.assigned_mechanic == Some(user.id),
    }
}

/// Checks the policy table; returns `Forbidden` when no rule grants the
/// action. Pure and side-effect free, so it is safe to call before any
/// entity is touched.
pub fn authorize(
    user: &AuthenticatedUser,
    action: Action,
    ctx: &OwnershipCtx,
) -> Result<(), ServiceError> {
    let allowed = POLICY
        .iter()
        .filter(|r| r.role == user.role && r.action == action)
        .any(|r| scope_matches(r.scope, user, ctx));

    if allowed {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "role {} is not allowed to {}",
            user.role, action
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser {
            id: Uuid::new_v4(),
            username: "tester".to_string(),
            role,
        }
    }

    #[test]
    fn only_the_owning_customer_approves() {
        let customer = user(UserRole::Customer);
        let own = OwnershipCtx::vehicle_owner(customer.id);
        let someone_elses = OwnershipCtx::vehicle_owner(Uuid::new_v4());

        assert!(authorize(&customer, Action::ApproveQuote, &own).is_ok());
        assert!(authorize(&customer, Action::ApproveQuote, &someone_elses).is_err());
        // mechanics and managers never approve, even for their own quotes
        let mechanic = user(UserRole::Mechanic);
        assert!(authorize(
            &mechanic,
            Action::ApproveQuote,
            &OwnershipCtx::vehicle_owner(mechanic.id)
        )
        .is_err());
        assert!(authorize(&user(UserRole::Manager), Action::ApproveQuote, &own).is_err());
    }

    #[test]
    fn rejection_follows_the_same_ownership_rule() {
        let customer = user(UserRole::Customer);
        assert!(authorize(
            &customer,
            Action::RejectQuote,
            &OwnershipCtx::vehicle_owner(customer.id)
        )
        .is_ok());
        assert!(authorize(&user(UserRole::Mechanic), Action::RejectQuote, &OwnershipCtx::default())
            .is_err());
    }

    #[test]
    fn generating_an_order_requires_assignment_for_mechanics() {
        let mechanic = user(UserRole::Mechanic);
        let assigned = OwnershipCtx {
            vehicle_owner: None,
            assigned_mechanic: Some(mechanic.id),
        };
        let unassigned = OwnershipCtx {
            vehicle_owner: None,
            assigned_mechanic: Some(Uuid::new_v4()),
        };

        assert!(authorize(&mechanic, Action::GenerateServiceOrder, &assigned).is_ok());
        assert!(authorize(&mechanic, Action::GenerateServiceOrder, &unassigned).is_err());
        // managers bypass the assignment restriction
        assert!(authorize(&user(UserRole::Manager), Action::GenerateServiceOrder, &unassigned).is_ok());
    }

    #[test]
    fn customers_cannot_touch_the_shop_floor() {
        let customer = user(UserRole::Customer);
        let ctx = OwnershipCtx::default();
        for action in [
            Action::CreateQuote,
            Action::AddPart,
            Action::ConcludeServiceOrder,
            Action::CancelServiceOrder,
            Action::AdjustStock,
            Action::ManageCatalog,
        ] {
            assert!(authorize(&customer, action, &ctx).is_err(), "{}", action);
        }
    }
}
