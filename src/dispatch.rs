use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use ethers_core::abi::{encode, Token};
use ethers_core::types::{Address, TransactionRequest, H256, U256};
use ethers_core::utils::{keccak256, to_checksum};
use ethers_middleware::SignerMiddleware;
use ethers_providers::{Http, Middleware, Provider};
use ethers_signers::{LocalWallet, Signer};
use tokio::time::timeout;
use tracing::info;

use crate::config::AppConfig;
use crate::domain::{DispatchReceipt, SurgeKind};

/// Durable recording of a detected surge. Implementations may be called
/// repeatedly for the same logical surge; the detector's cooldown is the
/// sole de-duplication guard.
#[async_trait]
pub trait AlertDispatcher {
    async fn dispatch(
        &self,
        wallet: Address,
        usd_value: f64,
        kind: SurgeKind,
    ) -> Result<DispatchReceipt>;
}

/// Broadcasts alerts as signed transactions to the AlertVault contract:
/// `alert(bytes32 alertId, address wallet, uint8 alertType, uint256 usdValue)`.
pub struct AlertVaultDispatcher {
    client: SignerMiddleware<Provider<Http>, LocalWallet>,
    contract: Address,
    broadcast_timeout: std::time::Duration,
    confirm_timeout: std::time::Duration,
}

impl AlertVaultDispatcher {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let provider =
            Provider::<Http>::try_from(config.rpc_url.as_str()).context("invalid RPC_URL")?;
        let wallet = config
            .private_key
            .parse::<LocalWallet>()
            .map_err(|e| anyhow!("PRIVATE_KEY is not a valid key: {e}"))?
            .with_chain_id(config.chain_id);
        Ok(Self {
            client: SignerMiddleware::new(provider, wallet),
            contract: config.alert_vault_address,
            broadcast_timeout: config.rpc_timeout,
            confirm_timeout: config.confirm_timeout,
        })
    }
}

#[async_trait]
impl AlertDispatcher for AlertVaultDispatcher {
    async fn dispatch(
        &self,
        wallet: Address,
        usd_value: f64,
        kind: SurgeKind,
    ) -> Result<DispatchReceipt> {
        let checksummed = to_checksum(&wallet, None);
        let alert_id = alert_id(&checksummed, Utc::now().timestamp_millis(), kind);

        info!("📤 Sending alert to AlertVault {:#x}", self.contract);
        info!(
            "   wallet {} value ${:.2} type {}",
            checksummed,
            usd_value,
            kind.label()
        );

        let calldata = alert_calldata(alert_id, wallet, kind, usd_to_units(usd_value));
        let tx = TransactionRequest::new().to(self.contract).data(calldata);

        // Broadcasting covers several RPC round-trips (nonce, gas, send);
        // each leg of a dispatch is bounded so a hung node cannot stall
        // the block drain.
        let pending = timeout(self.broadcast_timeout, self.client.send_transaction(tx, None))
            .await
            .context("timed out broadcasting alert transaction")?
            .context("failed to broadcast alert transaction")?;
        info!("   tx {:#x}, waiting for confirmation", pending.tx_hash());

        let receipt = timeout(self.confirm_timeout, pending)
            .await
            .context("timed out waiting for alert confirmation")?
            .context("alert transaction failed")?
            .ok_or_else(|| anyhow!("alert transaction dropped from mempool"))?;

        info!(
            "   ✅ Alert confirmed in block {}",
            receipt.block_number.map(|n| n.as_u64()).unwrap_or(0)
        );
        Ok(DispatchReceipt {
            tx_hash: receipt.transaction_hash,
        })
    }
}

fn alert_id(checksummed_wallet: &str, epoch_millis: i64, kind: SurgeKind) -> H256 {
    H256::from(keccak256(
        format!("{}|{}|{}", checksummed_wallet, epoch_millis, kind.code()).as_bytes(),
    ))
}

/// USD value with 18-decimal fixed precision, rounded to cents first.
fn usd_to_units(usd_value: f64) -> U256 {
    let cents = (usd_value * 100.0).round().max(0.0) as u128;
    U256::from(cents) * U256::exp10(16)
}

fn alert_calldata(alert_id: H256, wallet: Address, kind: SurgeKind, usd_units: U256) -> Vec<u8> {
    let selector = &keccak256(b"alert(bytes32,address,uint8,uint256)")[..4];
    let args = encode(&[
        Token::FixedBytes(alert_id.as_bytes().to_vec()),
        Token::Address(wallet),
        Token::Uint(U256::from(kind.code())),
        Token::Uint(usd_units),
    ]);
    [selector, args.as_slice()].concat()
}
