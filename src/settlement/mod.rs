pub mod ledger;
pub mod balance_book;
pub mod movement_book;
pub mod merchants;
pub mod reconciliation;
