use std::sync::Arc;

use anyhow::Context;
use paygate::api::rest::{ApiState, create_router};
use paygate::cache::query::MovementQuery;
use paygate::cache::read_cache::ReadCache;
use paygate::config::AppConfig;
use paygate::interfaces::merchant_directory::Merchant;
use paygate::interfaces::notification_dispatcher::NotificationDispatcher;
use paygate::movement::FundsMovementOrchestrator;
use paygate::notification::{KafkaNotificationDispatcher, LogDispatcher};
use paygate::observability::logging::init_logging;
use paygate::observability::metrics::Metrics;
use paygate::settlement::balance_book::BalanceBook;
use paygate::settlement::merchants::MerchantRegistry;
use paygate::settlement::movement_book::MovementBook;
use prometheus::Registry;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("PAYGATE_ENV").unwrap_or_else(|_| "development".to_string());
    let config = AppConfig::load(&env).context("loading configuration")?;

    init_logging(&config.logging);
    info!(service = %config.service.name, %env, "Starting");

    let registry = Registry::new();
    let metrics = Arc::new(Metrics::register(&registry).context("registering metrics")?);

    let balances = Arc::new(BalanceBook::new());
    for seed in &config.bootstrap.accounts {
        balances
            .open_account(seed.account_id.clone(), seed.balance)
            .context("seeding accounts")?;
    }

    let merchants = Arc::new(MerchantRegistry::new());
    for seed in &config.bootstrap.merchants {
        merchants.register(Merchant {
            merchant_id: seed.merchant_id,
            name: seed.name.clone(),
            settlement_account: seed.settlement_account.clone(),
        });
    }

    let movements = Arc::new(MovementBook::new());
    let cache = Arc::new(ReadCache::new());

    let dispatcher: Arc<dyn NotificationDispatcher> = if config.notification.enabled {
        Arc::new(KafkaNotificationDispatcher::new(&config.kafka).context("creating Kafka producer")?)
    } else {
        Arc::new(LogDispatcher)
    };

    let orchestrator = FundsMovementOrchestrator::new(
        balances.clone(),
        movements.clone(),
        merchants,
        dispatcher,
        cache.clone(),
        config.notification.clone(),
        metrics,
    );
    let query = MovementQuery::new(cache, balances, movements);

    let state = Arc::new(ApiState {
        orchestrator,
        query,
        registry,
        request_timeout: config.request_timeout(),
    });

    let listener = tokio::net::TcpListener::bind(&config.api.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.api.bind_addr))?;
    info!(addr = %config.api.bind_addr, "Listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
