//! Process entry point — wires the State Store, Event Bus, Token Info
//! Cache, Route Registry, and on-chain collaborator together, then runs
//! the Leader Event Ingress loop alongside a Copy Intent consumer that
//! drives each accepted order through Executor → Settlement → Position
//! Ledger → Notifier.

use copytrade_engine::admission::SubscriptionLocks;
use copytrade_engine::analytics::stats::Stats;
use copytrade_engine::bus::{Bus, Topic};
use copytrade_engine::cache::metadata::HeliusMetadataProvider;
use copytrade_engine::cache::TokenInfoCache;
use copytrade_engine::chain::{ChainClient, RpcChainClient};
use copytrade_engine::config::Config;
use copytrade_engine::domain::FollowerSwap;
use copytrade_engine::error::{AppError, Result};
use copytrade_engine::executor::{self, ExecutionOutcome};
use copytrade_engine::ingress::Ingress;
use copytrade_engine::ledger;
use copytrade_engine::notify;
use copytrade_engine::routes::bonding_curve::BondingCurveBuilder;
use copytrade_engine::routes::constant_product::ConstantProductBuilder;
use copytrade_engine::routes::aggregator::AggregatorBuilder;
use copytrade_engine::routes::{MinOutFloor, RouteRegistry, RuntimeFlags};
use copytrade_engine::shaper::slippage::DefaultSlippageOracle;
use copytrade_engine::store::Store;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config.log_level);

    info!("connecting to state store");
    let store = Store::connect(&config.database_url).await?;
    store.migrate().await?;

    info!("connecting to event bus");
    let bus = Bus::connect(&config.redis_url).await?;

    let chain: Arc<dyn ChainClient> = Arc::new(RpcChainClient::new(config.rpc_endpoints.clone())?);

    let metadata_provider = Arc::new(HeliusMetadataProvider::new(config.metadata_base_url.clone())?);
    let token_cache = TokenInfoCache::new(store.clone(), metadata_provider, Duration::from_secs(60 * 60 * 24));

    let oracle = Arc::new(DefaultSlippageOracle);
    let locks = Arc::new(SubscriptionLocks::new());
    let stats = Arc::new(Stats::new());

    let stats_for_logging = stats.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            stats_for_logging.log_stats();
        }
    });

    let routes = Arc::new(RouteRegistry::new(vec![
        Box::new(BondingCurveBuilder::new(chain.clone(), config.http_retry_count)),
        Box::new({
            let cp = ConstantProductBuilder::new(chain.clone(), config.http_retry_count);
            for (mint, pool_address) in &config.constant_product_pools {
                cp.register_pool(mint.clone(), pool_address.clone());
            }
            cp
        }),
        Box::new(AggregatorBuilder::new(
            config.aggregator_base_url.clone(),
            config.aggregator_timeout_ms,
            config.http_retry_count,
        )?),
    ]));

    let ingress = Ingress::new(
        bus.clone(),
        store.clone(),
        oracle.clone(),
        config.ignored_mints.clone(),
        locks.clone(),
        stats.clone(),
    );

    let ingress_handle = tokio::spawn(async move {
        if let Err(e) = ingress.run().await {
            error!(error = %e, "ingress loop exited");
        }
    });

    let copy_intent_handle = tokio::spawn(run_copy_intent_consumer(
        bus,
        store,
        chain,
        routes,
        locks,
        token_cache,
        stats,
        config,
    ));

    tokio::select! {
        res = ingress_handle => { res.map_err(|e| AppError::Init(e.to_string()))?; }
        res = copy_intent_handle => { res.map_err(|e| AppError::Init(e.to_string()))??; }
    }

    Ok(())
}

/// Drives every shaped `FollowerSwap` through Executor → Settlement →
/// Position Ledger → Notifier, one message at a time, under the same
/// subscription lock admission already used (§5: lock spans admission
/// through ledger application).
#[allow(clippy::too_many_arguments)]
async fn run_copy_intent_consumer(
    bus: Bus,
    store: Store,
    chain: Arc<dyn ChainClient>,
    routes: Arc<RouteRegistry>,
    locks: Arc<SubscriptionLocks>,
    token_cache: TokenInfoCache,
    stats: Arc<Stats>,
    config: Config,
) -> Result<()> {
    let mut consumer = bus.consumer(Topic::CopyIntent, "executor", "executor-0").await?;
    let producer = bus.producer();

    loop {
        let deliveries = consumer.read::<FollowerSwap>(16, 5_000).await?;
        for delivery in deliveries {
            let swap = delivery.payload;
            if let Err(e) = process_copy_intent(
                &store,
                chain.as_ref(),
                &routes,
                &locks,
                &token_cache,
                &stats,
                &config,
                &producer,
                &swap,
            )
            .await
            {
                warn!(error = %e, follower = %swap.follower_wallet, "failed to process copy intent");
                continue;
            }
            consumer.ack(&delivery.id).await?;
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn process_copy_intent(
    store: &Store,
    chain: &dyn ChainClient,
    routes: &RouteRegistry,
    locks: &SubscriptionLocks,
    token_cache: &TokenInfoCache,
    stats: &Stats,
    config: &Config,
    producer: &copytrade_engine::bus::Producer,
    swap: &FollowerSwap,
) -> Result<()> {
    let _guard = locks.lock(swap.subscription_pk).await;

    let subscription = store
        .get_subscription(swap.subscription_pk)
        .await?
        .ok_or_else(|| AppError::Init(format!("unknown subscription {}", swap.subscription_pk)))?;

    let (input_decimals, output_decimals) = decimals_for(swap);
    let min_out_floor = target_price_floor(swap);
    let flags = RuntimeFlags {
        use_bundle_relay: config.use_bundle_relay,
        priority_fee_lamports: swap.priority_fee,
    };

    let outcome = executor::execute(store, chain, routes, swap, min_out_floor, flags, &config.private_key).await?;

    let (new_record, analyzed) = match outcome {
        ExecutionOutcome::BuildFailed(reason) => {
            warn!(%reason, follower = %swap.follower_wallet, "route builder failed to assemble a transaction");
            (
                copytrade_engine::settlement::record_for_build_failure(swap, input_decimals, output_decimals),
                None,
            )
        }
        ExecutionOutcome::Submitted { signature } => {
            copytrade_engine::settlement::settle(chain, swap, &signature, input_decimals, output_decimals, config)
                .await?
        }
    };

    let output_amount = new_record.output_amount;
    let status = new_record.status;
    let signature = new_record.signature.clone();
    let record: copytrade_engine::store::models::SwapRecord = (&new_record).into();

    store.insert_swap_record(new_record).await?;

    let holding = store.get_holding(swap.subscription_pk, mint_for(swap)).await?;
    let token_info = if holding.is_none() {
        token_cache.get(mint_for(swap)).await.unwrap_or(None)
    } else {
        None
    };
    let now = copytrade_engine::utils::time::now_ts() as i64 / 1000;
    ledger::apply(
        store,
        &subscription,
        holding.as_ref(),
        swap,
        status,
        signature.as_deref(),
        output_amount,
        token_info.as_ref().map(|info| info.symbol.as_str()),
        now,
    )
    .await?;

    if status == copytrade_engine::store::models::TransactionStatus::Success {
        stats.inc_successful_trades();
    } else {
        stats.inc_failed_trades();
    }

    if analyzed.is_some() || status == copytrade_engine::store::models::TransactionStatus::Success {
        notify::notify(producer, swap, &record).await;
    }

    Ok(())
}

fn mint_for(swap: &FollowerSwap) -> &str {
    match swap.direction {
        copytrade_engine::domain::SwapDirection::Buy => &swap.output_mint,
        copytrade_engine::domain::SwapDirection::Sell => &swap.input_mint,
    }
}

fn decimals_for(swap: &FollowerSwap) -> (u8, u8) {
    match (&swap.source_leader_event, swap.direction) {
        (Some(event), copytrade_engine::domain::SwapDirection::Buy) => (9, event.to_decimals),
        (Some(event), copytrade_engine::domain::SwapDirection::Sell) => (event.from_decimals, 9),
        (None, _) => (9, 9),
    }
}

/// The target-price floor from §4.3: a copy buy refuses to fill worse
/// than the leader's own effective price. Sells and non-copy orders carry
/// no such floor.
fn target_price_floor(swap: &FollowerSwap) -> Option<MinOutFloor> {
    swap.target_price().map(|price| {
        let slippage = 1.0 - swap.slippage_bps as f64 / 10_000.0;
        let floor_ui = swap.ui_amount * price * slippage;
        let output_decimals = swap
            .source_leader_event
            .as_ref()
            .map(|e| e.to_decimals)
            .unwrap_or(9);
        MinOutFloor((floor_ui * 10f64.powi(output_decimals as i32)) as u64)
    })
}

fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();
}
