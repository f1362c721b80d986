use anyhow::{Context, Result};
use chrono::Utc;
use ethers_core::types::Transaction;
use ethers_core::utils::to_checksum;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::activity::WalletActivityStore;
use crate::chain::ChainReader;
use crate::config::AppConfig;
use crate::detector::SurgeDetector;
use crate::dispatch::AlertDispatcher;
use crate::domain::{Decision, SuppressReason};
use crate::filter;
use crate::price::UsdConverter;
use crate::utils::format_usd;

/// Drives the detection pipeline: discovers new blocks, folds their
/// transactions into the activity store, and dispatches surge alerts.
///
/// The poller alternates between idling on the poll interval and draining
/// blocks from `cursor + 1` up to the chain head, in order. The cursor only
/// advances past a block once every transaction in it has been folded in,
/// so a failed block is retried on the next cycle.
pub struct BlockPoller<R, D> {
    reader: R,
    dispatcher: D,
    store: WalletActivityStore,
    detector: SurgeDetector,
    converter: UsdConverter,
    min_tx_value_usd: f64,
    poll_interval: std::time::Duration,
    cursor: u64,
}

impl<R: ChainReader, D: AlertDispatcher> BlockPoller<R, D> {
    pub fn new(config: &AppConfig, reader: R, dispatcher: D) -> Self {
        Self {
            reader,
            dispatcher,
            store: WalletActivityStore::new(config.surge_window, config.retention_horizon),
            detector: SurgeDetector::new(config.whale_threshold_usd, config.alert_cooldown),
            converter: UsdConverter::new(config.eth_price_usd),
            min_tx_value_usd: config.min_tx_value_usd,
            poll_interval: config.poll_interval,
            cursor: 0,
        }
    }

    /// Runs until shutdown. Fails only when the chain reader cannot be
    /// reached at startup; the caller decides whether to restart.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        self.cursor = self
            .reader
            .current_height()
            .await
            .context("cannot reach chain reader")?;
        info!("✅ Blockchain monitor started");
        info!("   starting from block {}", self.cursor);
        info!("   polling every {:?}", self.poll_interval);

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => {}
            }
            if *shutdown.borrow() {
                info!("👋 Block poller stopping at cursor {}", self.cursor);
                return Ok(());
            }
            if let Err(e) = self.poll_cycle(&shutdown).await {
                warn!("❌ Poll cycle failed: {e:#}; retrying next interval");
            }
        }
    }

    /// One Idle→Draining transition: check the head and catch up. A height
    /// check failure is transient and bubbles up; block-level failures stop
    /// the drain without advancing the cursor past the failed block.
    async fn poll_cycle(&mut self, shutdown: &watch::Receiver<bool>) -> Result<()> {
        let head = self.reader.current_height().await?;
        if head <= self.cursor {
            return Ok(());
        }

        info!(
            "📦 New blocks: {} to {} ({} blocks)",
            self.cursor + 1,
            head,
            head - self.cursor
        );

        for height in self.cursor + 1..=head {
            if *shutdown.borrow() {
                info!(
                    "👋 Shutdown requested, drain stopped after block {}",
                    self.cursor
                );
                return Ok(());
            }
            match self.drain_block(height).await {
                Ok(()) => self.cursor = height,
                Err(e) => {
                    warn!("❌ Error processing block {height}: {e:#}; will retry next cycle");
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    async fn drain_block(&mut self, height: u64) -> Result<()> {
        let Some(transactions) = self.reader.block_transactions(height).await? else {
            debug!("block {height}: not available, treated as empty");
            return Ok(());
        };
        if transactions.is_empty() {
            debug!("block {height}: no transactions");
            return Ok(());
        }

        debug!("block {height}: {} transactions", transactions.len());
        for tx in &transactions {
            self.process_transaction(tx).await;
        }
        Ok(())
    }

    /// Per-transaction failures never abort the rest of the block.
    async fn process_transaction(&mut self, tx: &Transaction) {
        let qualified = match filter::qualify(tx, &self.converter, self.min_tx_value_usd) {
            Ok(Some(q)) => q,
            Ok(None) => return,
            Err(e) => {
                warn!("⏭️  Skipping tx {:#x}: {e:#}", tx.hash);
                return;
            }
        };

        let wallet = to_checksum(&qualified.recipient, None);
        let now = Utc::now();
        let windowed_total = self.store.record(
            &wallet,
            qualified.value_usd,
            &format!("{:#x}", qualified.tx_hash),
            now,
        );
        info!(
            "💰 Large transfer: {} → {}",
            format_usd(qualified.value_usd),
            wallet
        );

        match self
            .detector
            .evaluate(windowed_total, self.store.last_alert(&wallet), now)
        {
            Decision::Fire(kind) => {
                info!("🚨 {} detected!", kind.label());
                info!("   wallet {}", wallet);
                info!("   received in window: {}", format_usd(windowed_total));
                if let Some(stats) = self.store.stats(&wallet) {
                    info!("   transfers in window: {}", stats.transfers_in_window);
                }
                match self
                    .dispatcher
                    .dispatch(qualified.recipient, windowed_total, kind)
                    .await
                {
                    Ok(receipt) => {
                        // Only a confirmed dispatch arms the cooldown; a
                        // failed one leaves the surge eligible to re-fire.
                        self.store.mark_alerted(&wallet, Utc::now());
                        info!("   dispatched as {:#x}", receipt.tx_hash);
                    }
                    Err(e) => warn!("❌ Failed to dispatch alert for {wallet}: {e:#}"),
                }
            }
            Decision::Suppress(SuppressReason::CooldownActive) => {
                info!("⏭️  Surge for {wallet} already alerted recently, skipping");
            }
            Decision::Suppress(SuppressReason::BelowThreshold) => {}
        }
    }
}
