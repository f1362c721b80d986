pub mod activity;
pub mod chain;
pub mod config;
pub mod detector;
pub mod dispatch;
pub mod domain;
pub mod filter;
pub mod poller;
pub mod price;
pub mod utils;

use chain::EthChainReader;
use config::AppConfig;
use dispatch::AlertVaultDispatcher;
use poller::BlockPoller;
use utils::{format_usd, mask_url};

use anyhow::Result;
use tokio::sync::watch;
use tracing::{error, info};

pub async fn run() -> Result<()> {
    let config = AppConfig::from_env()?;

    info!("🔌 Chain RPC: {}", mask_url(&config.rpc_url));
    info!("🏦 AlertVault: {:#x}", config.alert_vault_address);
    info!(
        "🐋 Whale threshold: {}",
        format_usd(config.whale_threshold_usd)
    );
    info!(
        "💵 Min transaction: {}",
        format_usd(config.min_tx_value_usd)
    );
    info!("📈 ETH price: {}", format_usd(config.eth_price_usd));

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("👋 Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    // Startup failures restart the monitor after a fixed backoff instead of
    // killing the process; an outage shows up as a stalled cursor plus
    // repeated log entries, never a crash.
    loop {
        let reader = EthChainReader::new(&config.rpc_url, config.rpc_timeout)?;
        let dispatcher = AlertVaultDispatcher::new(&config)?;
        let mut poller = BlockPoller::new(&config, reader, dispatcher);

        match poller.run(shutdown_rx.clone()).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                error!(
                    "❌ Monitor failed to start: {e:#}; retrying in {:?}",
                    config.startup_retry
                );
                if backoff_or_shutdown(config.startup_retry, &mut shutdown_rx).await {
                    return Ok(());
                }
            }
        }
    }
}

/// Waits out the startup backoff, cut short if shutdown is signaled.
/// Returns whether shutdown was requested.
async fn backoff_or_shutdown(
    delay: std::time::Duration,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        _ = shutdown.changed() => {}
    }
    *shutdown.borrow()
}
