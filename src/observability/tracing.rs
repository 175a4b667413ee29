use tracing::Span;
use crate::types::ids::{AccountId, MerchantId, MovementId};

pub fn trace_transfer(origin: &AccountId, destination: &AccountId) -> Span {
    tracing::info_span!(
        "execute_transfer",
        origin = %origin,
        destination = %destination,
    )
}

pub fn trace_transfer_update(movement_id: &MovementId) -> Span {
    tracing::info_span!(
        "execute_transfer_update",
        movement_id = %movement_id,
    )
}

pub fn trace_debit(payer: &AccountId, merchant_id: &MerchantId) -> Span {
    tracing::info_span!(
        "execute_debit",
        payer = %payer,
        merchant_id = %merchant_id,
    )
}

pub fn trace_trash(movement_id: &MovementId, trashed: bool) -> Span {
    tracing::info_span!(
        "set_trashed",
        movement_id = %movement_id,
        trashed,
    )
}
