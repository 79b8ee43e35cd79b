//! Billing state machine for card links.
//!
//! Mirrors the transaction workflow with `billing` as the open state and
//! `canceled` as the terminal one. A canceled card link blocks non-admin
//! edits and deletes.

use crate::auth::claims::Role;
use crate::error::ApiError;
use crate::transactions::workflow::TransitionOutcome;

use super::repo::CardLinkStatus;

pub fn plan_transition(
    current: CardLinkStatus,
    requested: CardLinkStatus,
    role: Role,
) -> Result<TransitionOutcome, ApiError> {
    if requested != CardLinkStatus::Canceled {
        return Err(ApiError::validation("status may only change to canceled"));
    }
    if !role.is_admin() {
        return Err(ApiError::Forbidden);
    }
    match current {
        CardLinkStatus::Billing => Ok(TransitionOutcome::Transitioned),
        CardLinkStatus::Canceled => Ok(TransitionOutcome::AlreadyTerminal),
    }
}

pub fn check_field_edit(
    status: CardLinkStatus,
    role: Role,
    is_owner: bool,
) -> Result<(), ApiError> {
    if role.is_admin() {
        return Ok(());
    }
    if !is_owner {
        return Err(ApiError::Forbidden);
    }
    match status {
        CardLinkStatus::Billing => Ok(()),
        CardLinkStatus::Canceled => Err(ApiError::Forbidden),
    }
}

pub fn check_delete(status: CardLinkStatus, role: Role, is_owner: bool) -> Result<(), ApiError> {
    check_field_edit(status, role, is_owner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_cancels_a_billing_link() {
        let outcome =
            plan_transition(CardLinkStatus::Billing, CardLinkStatus::Canceled, Role::Admin)
                .unwrap();
        assert_eq!(outcome, TransitionOutcome::Transitioned);
    }

    #[test]
    fn cancel_is_idempotent() {
        let outcome =
            plan_transition(CardLinkStatus::Canceled, CardLinkStatus::Canceled, Role::Admin)
                .unwrap();
        assert_eq!(outcome, TransitionOutcome::AlreadyTerminal);
    }

    #[test]
    fn cannot_reactivate_and_non_admin_cannot_cancel() {
        assert!(matches!(
            plan_transition(CardLinkStatus::Canceled, CardLinkStatus::Billing, Role::Admin),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            plan_transition(CardLinkStatus::Billing, CardLinkStatus::Canceled, Role::Staff),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn canceled_blocks_owner_edits_and_deletes() {
        assert!(check_field_edit(CardLinkStatus::Billing, Role::Staff, true).is_ok());
        assert!(check_field_edit(CardLinkStatus::Canceled, Role::Staff, true).is_err());
        assert!(check_delete(CardLinkStatus::Canceled, Role::Accountant, true).is_err());
        // Admin is never blocked.
        assert!(check_field_edit(CardLinkStatus::Canceled, Role::Admin, false).is_ok());
    }
}
