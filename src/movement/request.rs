use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::types::balance::Balance;
use crate::types::ids::{AccountId, MerchantId, MovementId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub origin: AccountId,
    pub destination: AccountId,
    pub amount: Balance,
}

impl TransferRequest {
    pub fn new(origin: impl Into<AccountId>, destination: impl Into<AccountId>, amount: i64) -> Self {
        TransferRequest {
            origin: origin.into(),
            destination: destination.into(),
            amount: Balance::from_i64(amount),
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive(self.amount)?;
        if self.origin == self.destination {
            return Err(Error::SameParty(self.origin.clone()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebitRequest {
    pub payer: AccountId,
    pub merchant_id: MerchantId,
    pub amount: Balance,
    pub payment_method: String,
}

impl DebitRequest {
    pub fn validate(&self) -> Result<()> {
        ensure_positive(self.amount)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferUpdateRequest {
    pub movement_id: MovementId,
    pub new_amount: Balance,
}

impl TransferUpdateRequest {
    pub fn validate(&self) -> Result<()> {
        ensure_positive(self.new_amount)
    }
}

fn ensure_positive(amount: Balance) -> Result<()> {
    if !amount.is_positive() {
        return Err(Error::InvalidAmount(amount));
    }
    Ok(())
}

/// Per-request execution context.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommandContext {
    deadline: Option<Instant>,
}

impl CommandContext {
    pub fn new() -> Self {
        CommandContext { deadline: None }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        CommandContext {
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        CommandContext {
            deadline: Some(deadline),
        }
    }

    /// Checked once, right before the first balance write. Later steps ignore
    /// the deadline.
    pub fn ensure_not_expired(&self) -> Result<()> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Error::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_amounts() {
        let zero = TransferRequest::new("A", "B", 0);
        assert!(matches!(zero.validate(), Err(Error::InvalidAmount(_))));

        let negative = TransferRequest::new("A", "B", -10);
        assert!(matches!(negative.validate(), Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn rejects_self_transfer() {
        let req = TransferRequest::new("A", "A", 10);
        assert!(matches!(req.validate(), Err(Error::SameParty(_))));
    }

    #[tokio::test]
    async fn expired_context_is_detected() {
        let ctx = CommandContext::with_deadline(Instant::now() - Duration::from_millis(1));
        assert!(matches!(ctx.ensure_not_expired(), Err(Error::DeadlineExceeded)));

        let ctx = CommandContext::with_timeout(Duration::from_secs(60));
        assert!(ctx.ensure_not_expired().is_ok());
        assert!(CommandContext::new().ensure_not_expired().is_ok());
    }
}
