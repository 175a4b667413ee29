pub mod balance;
pub mod ids;
pub mod account;
