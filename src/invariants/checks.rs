use crate::error::{Error, InvariantViolation, Result};
use crate::movement::record::MovementStatus;
use crate::types::account::AccountBalance;
use crate::types::balance::Balance;

pub struct InvariantChecks;

impl InvariantChecks {
    /// Check no negative balances
    pub fn check_no_negative_balances(accounts: &[AccountBalance]) -> Result<()> {
        for account in accounts {
            if account.balance.is_negative() {
                return Err(Error::InvariantViolation(InvariantViolation {
                    invariant: "no_negative_balances",
                    details: format!(
                        "Account {} has negative balance: {}",
                        account.account_id,
                        account.balance
                    ),
                }));
            }
        }
        Ok(())
    }

    /// Check that a set of balances still sums to what it did before
    pub fn check_conservation(expected: Balance, actual: Balance) -> Result<()> {
        if expected != actual {
            return Err(Error::ConservationOfValueViolation { expected, actual });
        }
        Ok(())
    }

    /// Check a movement status write only moves forward
    pub fn check_status_transition(from: MovementStatus, to: MovementStatus) -> Result<()> {
        if !from.can_transition_to(to) {
            return Err(Error::InvariantViolation(InvariantViolation {
                invariant: "status_monotonicity",
                details: format!("illegal status transition {} -> {}", from, to),
            }));
        }
        Ok(())
    }
}
