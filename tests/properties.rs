mod common;

use std::sync::atomic::Ordering;

use common::Harness;
use paygate::error::Error;
use paygate::movement::record::MovementStatus;
use paygate::movement::request::{CommandContext, TransferRequest};
use paygate::settlement::reconciliation::Reconciliation;
use paygate::types::balance::Balance;
use paygate::types::ids::AccountId;
use proptest::prelude::*;

const ACCOUNTS: [&str; 3] = ["4111111111111111", "4222222222222222", "4333333333333333"];
const OPENING: [i64; 3] = [1000, 500, 0];
const TOTAL: i64 = 1500;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn setup() -> Harness {
    let h = Harness::new();
    for (account, balance) in ACCOUNTS.iter().zip(OPENING) {
        h.open(account, balance);
    }
    h
}

fn balances(h: &Harness) -> Vec<i64> {
    ACCOUNTS.iter().map(|a| h.balance(a)).collect()
}

fn account_ids() -> Vec<AccountId> {
    ACCOUNTS.iter().map(|a| AccountId::new(*a)).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn transfers_conserve_value_and_never_overdraw(
        ops in prop::collection::vec((0usize..3, 0usize..3, 1i64..700), 1..20)
    ) {
        let rt = runtime();
        let h = setup();

        for (from, to, amount) in ops {
            let before = balances(&h);
            let result = rt.block_on(h.orchestrator.execute_transfer(
                &CommandContext::new(),
                TransferRequest::new(ACCOUNTS[from], ACCOUNTS[to], amount),
            ));

            match result {
                Ok(outcome) => {
                    prop_assert_eq!(outcome.record.status, MovementStatus::Success);
                    let after = balances(&h);
                    prop_assert_eq!(after[from], before[from] - amount);
                    prop_assert_eq!(after[to], before[to] + amount);
                }
                Err(Error::InsufficientFunds { .. }) | Err(Error::SameParty(_)) => {
                    prop_assert_eq!(balances(&h), before);
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }

            prop_assert!(balances(&h).iter().all(|b| *b >= 0));
            prop_assert!(Reconciliation::verify_conservation_of_value(
                &h.book,
                &account_ids(),
                Balance::from_i64(TOTAL),
            )
            .is_ok());
        }

        prop_assert!(Reconciliation::reconcile_all(&h.book).is_ok());
    }

    #[test]
    fn clean_failures_leave_balances_untouched(
        failing_calls in prop::collection::btree_set(1usize..5, 0..3),
        fail_create in any::<bool>(),
        amount in 1i64..1000,
    ) {
        let rt = runtime();
        let h = setup();
        let calls: Vec<usize> = failing_calls.into_iter().collect();
        h.balances.fail_set_calls(&calls);
        h.movements.faults.fail_create.store(fail_create, Ordering::SeqCst);

        let before = balances(&h);
        let result = rt.block_on(h.orchestrator.execute_transfer(
            &CommandContext::new(),
            TransferRequest::new(ACCOUNTS[0], ACCOUNTS[1], amount),
        ));

        match result {
            Ok(_) => {
                let after = balances(&h);
                prop_assert_eq!(after[0], before[0] - amount);
                prop_assert_eq!(after[1], before[1] + amount);
            }
            Err(e) if e.requires_reconciliation() => {
                prop_assert!(matches!(e, Error::CompensationFailed { .. }), "unexpected error: {}", e);
            }
            Err(e) => {
                prop_assert!(matches!(e, Error::Storage(_)), "unexpected error: {}", e);
                prop_assert_eq!(balances(&h), before);
                prop_assert!(h.movement_book.is_empty());
            }
        }
    }
}
