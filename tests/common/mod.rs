//! Shared harness: the in-memory backends wrapped by fault-injecting stores.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use paygate::cache::query::MovementQuery;
use paygate::cache::read_cache::ReadCache;
use paygate::config::notification::NotificationConfig;
use paygate::error::{DeliveryError, StorageError};
use paygate::interfaces::balance_store::BalanceStore;
use paygate::interfaces::cache_invalidator::{CacheInvalidator, CacheKey};
use paygate::interfaces::merchant_directory::Merchant;
use paygate::interfaces::movement_store::MovementStore;
use paygate::interfaces::notification_dispatcher::NotificationDispatcher;
use paygate::movement::FundsMovementOrchestrator;
use paygate::movement::record::{MovementRecord, MovementStatus, NewMovement};
use paygate::observability::metrics::Metrics;
use paygate::settlement::balance_book::BalanceBook;
use paygate::settlement::merchants::MerchantRegistry;
use paygate::settlement::movement_book::MovementBook;
use paygate::types::account::AccountBalance;
use paygate::types::balance::Balance;
use paygate::types::ids::{AccountId, MerchantId, MovementId};
use prometheus::Registry;

/// Fails the n-th `set` calls (1-based) listed in `fail_on`.
pub struct FlakyBalances {
    inner: Arc<BalanceBook>,
    set_calls: AtomicUsize,
    fail_on: Mutex<HashSet<usize>>,
    set_delay: Mutex<Option<Duration>>,
}

impl FlakyBalances {
    pub fn new(inner: Arc<BalanceBook>) -> Self {
        FlakyBalances {
            inner,
            set_calls: AtomicUsize::new(0),
            fail_on: Mutex::new(HashSet::new()),
            set_delay: Mutex::new(None),
        }
    }

    /// Make the given upcoming `set` calls fail, counted from now.
    pub fn fail_set_calls(&self, calls: &[usize]) {
        let base = self.set_calls.load(Ordering::SeqCst);
        let mut fail_on = self.fail_on.lock().unwrap();
        fail_on.clear();
        fail_on.extend(calls.iter().map(|n| base + n));
    }

    pub fn delay_sets(&self, delay: Duration) {
        *self.set_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BalanceStore for FlakyBalances {
    async fn get(&self, account_id: &AccountId) -> Result<Option<AccountBalance>, StorageError> {
        self.inner.get(account_id).await
    }

    async fn set(&self, account_id: &AccountId, balance: Balance) -> Result<(), StorageError> {
        let call = self.set_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = *self.set_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let fail = self.fail_on.lock().unwrap().contains(&call);
        if fail {
            return Err(StorageError::new("balance.set", format!("injected failure on call {}", call)));
        }
        self.inner.set(account_id, balance).await
    }
}

#[derive(Default)]
pub struct MovementFaults {
    pub fail_create: AtomicBool,
    pub fail_success_status: AtomicBool,
    pub fail_failed_status: AtomicBool,
    pub fail_update: AtomicBool,
}

pub struct FlakyMovements {
    inner: Arc<MovementBook>,
    pub faults: MovementFaults,
}

impl FlakyMovements {
    pub fn new(inner: Arc<MovementBook>) -> Self {
        FlakyMovements {
            inner,
            faults: MovementFaults::default(),
        }
    }
}

fn injected(operation: &'static str) -> StorageError {
    StorageError::new(operation, "injected failure")
}

#[async_trait]
impl MovementStore for FlakyMovements {
    async fn create(&self, movement: NewMovement) -> Result<MovementRecord, StorageError> {
        if self.faults.fail_create.load(Ordering::SeqCst) {
            return Err(injected("movement.create"));
        }
        self.inner.create(movement).await
    }

    async fn get(&self, movement_id: &MovementId) -> Result<Option<MovementRecord>, StorageError> {
        self.inner.get(movement_id).await
    }

    async fn update_status(
        &self,
        movement_id: &MovementId,
        status: MovementStatus,
    ) -> Result<(), StorageError> {
        let fail = match status {
            MovementStatus::Success => self.faults.fail_success_status.load(Ordering::SeqCst),
            MovementStatus::Failed => self.faults.fail_failed_status.load(Ordering::SeqCst),
            MovementStatus::Pending => false,
        };
        if fail {
            return Err(injected("movement.update_status"));
        }
        self.inner.update_status(movement_id, status).await
    }

    async fn update(&self, record: MovementRecord) -> Result<MovementRecord, StorageError> {
        if self.faults.fail_update.load(Ordering::SeqCst) {
            return Err(injected("movement.update"));
        }
        self.inner.update(record).await
    }

    async fn set_trashed(
        &self,
        movement_id: &MovementId,
        trashed: bool,
    ) -> Result<MovementRecord, StorageError> {
        self.inner.set_trashed(movement_id, trashed).await
    }
}

#[derive(Clone, Debug)]
pub struct SentNotification {
    pub topic: String,
    pub key: String,
    pub payload: serde_json::Value,
}

#[derive(Default)]
pub struct RecordingDispatcher {
    pub sent: Mutex<Vec<SentNotification>>,
    pub fail: AtomicBool,
}

impl RecordingDispatcher {
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn send(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), DeliveryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeliveryError("broker unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(SentNotification {
            topic: topic.to_string(),
            key: key.to_string(),
            payload: serde_json::from_slice(payload).unwrap(),
        });
        Ok(())
    }
}

pub struct FlakyInvalidator {
    inner: Arc<ReadCache>,
    pub fail: AtomicBool,
    pub calls: Mutex<Vec<Vec<CacheKey>>>,
}

#[async_trait]
impl CacheInvalidator for FlakyInvalidator {
    async fn invalidate(&self, keys: &[CacheKey]) -> Result<(), DeliveryError> {
        self.calls.lock().unwrap().push(keys.to_vec());
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeliveryError("cache unreachable".to_string()));
        }
        self.inner.invalidate(keys).await
    }
}

pub struct Harness {
    pub book: Arc<BalanceBook>,
    pub balances: Arc<FlakyBalances>,
    pub movement_book: Arc<MovementBook>,
    pub movements: Arc<FlakyMovements>,
    pub merchants: Arc<MerchantRegistry>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub cache: Arc<ReadCache>,
    pub invalidator: Arc<FlakyInvalidator>,
    pub registry: Registry,
    pub metrics: Arc<Metrics>,
    pub orchestrator: FundsMovementOrchestrator,
}

impl Harness {
    pub fn new() -> Self {
        let book = Arc::new(BalanceBook::new());
        let balances = Arc::new(FlakyBalances::new(book.clone()));
        let movement_book = Arc::new(MovementBook::new());
        let movements = Arc::new(FlakyMovements::new(movement_book.clone()));
        let merchants = Arc::new(MerchantRegistry::new());
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let cache = Arc::new(ReadCache::new());
        let invalidator = Arc::new(FlakyInvalidator {
            inner: cache.clone(),
            fail: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        });
        let registry = Registry::new();
        let metrics = Arc::new(Metrics::register(&registry).unwrap());

        let orchestrator = FundsMovementOrchestrator::new(
            balances.clone(),
            movements.clone(),
            merchants.clone(),
            dispatcher.clone(),
            invalidator.clone(),
            NotificationConfig::default(),
            metrics.clone(),
        );

        Harness {
            book,
            balances,
            movement_book,
            movements,
            merchants,
            dispatcher,
            cache,
            invalidator,
            registry,
            metrics,
            orchestrator,
        }
    }

    pub fn open(&self, account: &str, balance: i64) -> AccountId {
        let id = AccountId::new(account);
        self.book.open_account(id.clone(), Balance::from_i64(balance)).unwrap();
        id
    }

    pub fn balance(&self, account: &str) -> i64 {
        self.book.balance_of(&AccountId::new(account)).unwrap().to_i64()
    }

    pub fn register_merchant(&self, name: &str, settlement_account: &str) -> MerchantId {
        let merchant_id = MerchantId::new();
        self.merchants.register(Merchant {
            merchant_id,
            name: name.to_string(),
            settlement_account: AccountId::new(settlement_account),
        });
        merchant_id
    }

    /// Cached read path over the same stores the orchestrator writes.
    pub fn query(&self) -> MovementQuery {
        MovementQuery::new(self.cache.clone(), self.balances.clone(), self.movements.clone())
    }

    pub fn compensations(&self, result: &str) -> u64 {
        self.metrics.compensations_total.with_label_values(&[result]).get()
    }

    pub fn commands(&self, operation: &str, outcome: &str) -> u64 {
        self.metrics
            .commands_total
            .with_label_values(&[operation, outcome])
            .get()
    }
}
