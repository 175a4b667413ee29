use crate::error::{Error, Result};
use crate::invariants::checks::InvariantChecks;
use crate::settlement::balance_book::BalanceBook;
use crate::types::balance::Balance;
use crate::types::ids::AccountId;

pub struct Reconciliation;

impl Reconciliation {
    /// Reconcile an account's current balance with its write ledger
    pub fn reconcile_account(
        book: &BalanceBook,
        account_id: &AccountId,
    ) -> Result<()> {
        let ledger = book.ledger(account_id)
            .ok_or_else(|| Error::PartyNotFound(crate::error::Party::Account(account_id.clone())))?;
        let actual = book.balance_of(account_id).unwrap_or_default();
        let expected = ledger.replay()
            .ok_or_else(|| Error::Overflow { operation: "ledger replay".to_string() })?;

        if actual != expected {
            return Err(Error::ReconciliationFailed {
                account_id: account_id.clone(),
                expected,
                actual,
            });
        }

        Ok(())
    }

    /// Reconcile every account in the book
    pub fn reconcile_all(book: &BalanceBook) -> Result<()> {
        for account in book.snapshot() {
            Self::reconcile_account(book, &account.account_id)?;
        }
        InvariantChecks::check_no_negative_balances(&book.snapshot())
    }

    /// Verify the accounts still hold `expected_total` between them
    pub fn verify_conservation_of_value(
        book: &BalanceBook,
        accounts: &[AccountId],
        expected_total: Balance,
    ) -> Result<()> {
        let actual = accounts.iter()
            .filter_map(|id| book.balance_of(id))
            .try_fold(Balance::zero(), |acc, b| acc.checked_add(b))
            .ok_or_else(|| Error::Overflow { operation: "conservation total".to_string() })?;

        InvariantChecks::check_conservation(expected_total, actual)
    }
}
