// Surgewatch - whale surge monitor
// Polls the chain for unusually large inbound value flows and raises
// on-chain alerts when a wallet's windowed inflow crosses the threshold.

use anyhow::Result;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    match dotenv::dotenv() {
        Ok(path) => info!("📄 Loaded .env from {:?}", path),
        Err(e) => warn!("⚠️  Could not load .env file: {}", e),
    }

    info!("🏗️  Starting Surgewatch - Whale Surge Monitor");
    surgewatch::run().await
}
