//! Leader Event Ingress (LEI) §4.1 — consumes `leader_tx`, classifies, and
//! fans out one admission check per active subscription on the leader.
//!
//! Grounded on the source's `CopyTradeProcessor._process_tx_event`: look up
//! subscriptions for `tx_event.who`, assign input/output mints by
//! direction, drop ignored mints before any subscription work happens.

use crate::admission::{self, AdmissionOutcome};
use crate::analytics::stats::Stats;
use crate::bus::{Bus, Topic};
use crate::domain::{LeaderTxEvent, SwapDirection, WSOL_MINT};
use crate::error::Result;
use crate::shaper;
use crate::shaper::slippage::SlippageOracle;
use crate::store::Store;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct Ingress {
    bus: Bus,
    store: Store,
    oracle: Arc<dyn SlippageOracle>,
    ignored_mints: HashSet<String>,
    locks: Arc<admission::SubscriptionLocks>,
    stats: Arc<Stats>,
}

impl Ingress {
    pub fn new(
        bus: Bus,
        store: Store,
        oracle: Arc<dyn SlippageOracle>,
        ignored_mints: HashSet<String>,
        locks: Arc<admission::SubscriptionLocks>,
        stats: Arc<Stats>,
    ) -> Self {
        Self {
            bus,
            store,
            oracle,
            ignored_mints,
            locks,
            stats,
        }
    }

    /// Consumer-group loop. Each `leader_tx` message is acknowledged only
    /// after a `copy_intent` has been durably enqueued for every matching
    /// active subscription — the at-least-once redelivery contract from §5
    /// applies to the whole fan-out, not just the read.
    pub async fn run(&self) -> Result<()> {
        let mut consumer = self.bus.consumer(Topic::LeaderTx, "lei", "lei-0").await?;
        let producer = self.bus.producer();

        loop {
            let deliveries = consumer.read::<LeaderTxEvent>(16, 5_000).await?;
            for delivery in deliveries {
                if let Err(e) = self.process_event(&delivery.payload, &producer).await {
                    warn!(error = %e, signature = %delivery.payload.signature, "ingress failed to process event");
                    continue;
                }
                consumer.ack(&delivery.id).await?;
            }
        }
    }

    #[instrument(skip_all, fields(signature = %event.signature, leader = %event.leader_wallet))]
    async fn process_event(
        &self,
        event: &LeaderTxEvent,
        producer: &crate::bus::Producer,
    ) -> Result<()> {
        let (input_mint, output_mint) = match event.direction {
            SwapDirection::Buy => (WSOL_MINT.to_string(), event.mint.clone()),
            SwapDirection::Sell => (event.mint.clone(), WSOL_MINT.to_string()),
        };

        if self.ignored_mints.contains(&input_mint) || self.ignored_mints.contains(&output_mint) {
            info!(mint = %event.mint, "dropping event on ignored mint");
            return Ok(());
        }

        self.stats.inc_swaps_detected();

        let subscriptions = self
            .store
            .get_active_subscriptions_for_leader(&event.leader_wallet)
            .await?;

        for subscription in subscriptions {
            let _guard = self.locks.lock(subscription.id).await;

            let outcome = admission::check(&self.store, &subscription, event).await?;
            match outcome {
                AdmissionOutcome::Rejected(reason) => {
                    self.store.increment_filtered_times(subscription.id).await?;
                    info!(subscription = subscription.id, ?reason, "admission rejected");
                }
                AdmissionOutcome::Accepted(holding) => {
                    let intent =
                        shaper::shape(&subscription, event, holding.as_ref(), self.oracle.as_ref())
                            .await?;
                    producer.publish(Topic::CopyIntent, &intent).await?;
                }
            }
        }

        Ok(())
    }
}
