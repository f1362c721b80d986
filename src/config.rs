use std::env;

use anyhow::{anyhow, Result};
use chrono::Duration;
use ethers_core::types::Address;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rpc_url: String,
    pub alert_vault_address: Address,
    pub private_key: String,
    pub chain_id: u64,
    pub whale_threshold_usd: f64,
    pub min_tx_value_usd: f64,
    pub eth_price_usd: f64,
    pub poll_interval: std::time::Duration,
    pub surge_window: Duration,
    pub alert_cooldown: Duration,
    pub retention_horizon: Duration,
    pub rpc_timeout: std::time::Duration,
    pub confirm_timeout: std::time::Duration,
    pub startup_retry: std::time::Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let rpc_url = env::var("RPC_URL").map_err(|_| anyhow!("RPC_URL must be set in .env"))?;

        let alert_vault_address = env::var("ALERT_VAULT_ADDRESS")
            .map_err(|_| anyhow!("ALERT_VAULT_ADDRESS must be set in .env"))?
            .parse::<Address>()
            .map_err(|e| anyhow!("ALERT_VAULT_ADDRESS is not a valid address: {e}"))?;

        let private_key =
            env::var("PRIVATE_KEY").map_err(|_| anyhow!("PRIVATE_KEY must be set in .env"))?;

        let chain_id = env_or_default("CHAIN_ID", 560048u64);
        let whale_threshold_usd = env_or_default("WHALE_THRESHOLD_USD", 100_000.0);
        let min_tx_value_usd = env_or_default("MIN_TX_VALUE_USD", 10_000.0);
        let eth_price_usd = env_or_default("ETH_PRICE_USD", 2_000.0);

        let poll_interval =
            std::time::Duration::from_millis(env_or_default("POLL_INTERVAL_MS", 5_000u64));
        let surge_window = Duration::seconds(env_or_default("SURGE_WINDOW_SECS", 3_600i64));
        // At most one alert per address per window unless overridden.
        let alert_cooldown = Duration::seconds(env_or_default(
            "ALERT_COOLDOWN_SECS",
            surge_window.num_seconds(),
        ));
        let retention_horizon = Duration::hours(env_or_default("RETENTION_HOURS", 24i64));
        let rpc_timeout = std::time::Duration::from_secs(env_or_default("RPC_TIMEOUT_SECS", 30u64));
        let confirm_timeout =
            std::time::Duration::from_secs(env_or_default("CONFIRM_TIMEOUT_SECS", 120u64));
        let startup_retry =
            std::time::Duration::from_secs(env_or_default("STARTUP_RETRY_SECS", 10u64));

        Ok(Self {
            rpc_url,
            alert_vault_address,
            private_key,
            chain_id,
            whale_threshold_usd,
            min_tx_value_usd,
            eth_price_usd,
            poll_interval,
            surge_window,
            alert_cooldown,
            retention_horizon,
            rpc_timeout,
            confirm_timeout,
            startup_retry,
        })
    }
}

fn env_or_default<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| parse_trimmed(&v))
        .unwrap_or(default)
}

fn parse_trimmed<T: std::str::FromStr>(raw: &str) -> Option<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}
