//! Approval state machine for transactions.
//!
//! `pending` is the only open state; `approved` and `rejected` are terminal
//! and absorb further transition requests as no-ops so a double-submitted
//! approval never errors (and never re-notifies).

use crate::auth::claims::Role;
use crate::error::ApiError;

use super::repo::TxStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The record moved into the requested terminal state.
    Transitioned,
    /// The record was already terminal; nothing to do.
    AlreadyTerminal,
}

/// Decide whether a requested status change may happen, without touching
/// storage.
pub fn plan_transition(
    current: TxStatus,
    requested: TxStatus,
    role: Role,
) -> Result<TransitionOutcome, ApiError> {
    if !matches!(requested, TxStatus::Approved | TxStatus::Rejected) {
        return Err(ApiError::validation(
            "status may only change to approved or rejected",
        ));
    }
    if !role.is_admin() {
        return Err(ApiError::Forbidden);
    }
    match current {
        TxStatus::Pending => Ok(TransitionOutcome::Transitioned),
        TxStatus::Approved | TxStatus::Rejected => Ok(TransitionOutcome::AlreadyTerminal),
    }
}

/// Owners may change payload fields only while the record is open; admins
/// always may. Anyone else is rejected outright.
pub fn check_field_edit(status: TxStatus, role: Role, is_owner: bool) -> Result<(), ApiError> {
    if role.is_admin() {
        return Ok(());
    }
    if !is_owner {
        return Err(ApiError::Forbidden);
    }
    match status {
        TxStatus::Pending => Ok(()),
        TxStatus::Approved | TxStatus::Rejected => Err(ApiError::Forbidden),
    }
}

/// Deletion follows the same gate as field edits.
pub fn check_delete(status: TxStatus, role: Role, is_owner: bool) -> Result<(), ApiError> {
    check_field_edit(status, role, is_owner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_moves_pending_to_terminal() {
        for requested in [TxStatus::Approved, TxStatus::Rejected] {
            let outcome = plan_transition(TxStatus::Pending, requested, Role::Admin).unwrap();
            assert_eq!(outcome, TransitionOutcome::Transitioned);
        }
    }

    #[test]
    fn non_admin_cannot_transition() {
        for role in [Role::Staff, Role::Accountant] {
            let err = plan_transition(TxStatus::Pending, TxStatus::Approved, role).unwrap_err();
            assert!(matches!(err, ApiError::Forbidden));
        }
    }

    #[test]
    fn terminal_states_absorb_repeat_requests() {
        // Second approval of the same transaction is a no-op, not an error.
        for current in [TxStatus::Approved, TxStatus::Rejected] {
            for requested in [TxStatus::Approved, TxStatus::Rejected] {
                let outcome = plan_transition(current, requested, Role::Admin).unwrap();
                assert_eq!(outcome, TransitionOutcome::AlreadyTerminal);
            }
        }
    }

    #[test]
    fn cannot_revert_to_pending() {
        let err = plan_transition(TxStatus::Approved, TxStatus::Pending, Role::Admin).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn owner_edits_only_while_pending() {
        assert!(check_field_edit(TxStatus::Pending, Role::Staff, true).is_ok());
        for status in [TxStatus::Approved, TxStatus::Rejected] {
            let err = check_field_edit(status, Role::Staff, true).unwrap_err();
            assert!(matches!(err, ApiError::Forbidden));
        }
    }

    #[test]
    fn admin_edits_any_status() {
        for status in [TxStatus::Pending, TxStatus::Approved, TxStatus::Rejected] {
            assert!(check_field_edit(status, Role::Admin, false).is_ok());
        }
    }

    #[test]
    fn strangers_never_edit_or_delete() {
        assert!(check_field_edit(TxStatus::Pending, Role::Staff, false).is_err());
        assert!(check_delete(TxStatus::Pending, Role::Accountant, false).is_err());
    }

    #[test]
    fn owner_cannot_delete_once_closed() {
        assert!(check_delete(TxStatus::Pending, Role::Staff, true).is_ok());
        assert!(check_delete(TxStatus::Approved, Role::Staff, true).is_err());
    }
}
