use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers_core::types::Transaction;
use ethers_providers::{Http, Middleware, Provider};
use tokio::time::timeout;

/// Sequential, idempotent access to blocks and their transactions. A
/// finalized height returns the same transaction set on repeated calls,
/// which is what makes retrying a failed block safe.
#[async_trait]
pub trait ChainReader {
    async fn current_height(&self) -> Result<u64>;

    /// `Ok(None)` means the block is not (yet) available at this height;
    /// the poller treats that the same as an empty block.
    async fn block_transactions(&self, height: u64) -> Result<Option<Vec<Transaction>>>;
}

/// JSON-RPC chain reader with a bounded timeout per call.
pub struct EthChainReader {
    provider: Provider<Http>,
    rpc_timeout: std::time::Duration,
}

impl EthChainReader {
    pub fn new(rpc_url: &str, rpc_timeout: std::time::Duration) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .with_context(|| "invalid RPC_URL".to_string())?;
        Ok(Self {
            provider,
            rpc_timeout,
        })
    }
}

#[async_trait]
impl ChainReader for EthChainReader {
    async fn current_height(&self) -> Result<u64> {
        let height = timeout(self.rpc_timeout, self.provider.get_block_number())
            .await
            .context("timed out fetching chain height")??;
        Ok(height.as_u64())
    }

    async fn block_transactions(&self, height: u64) -> Result<Option<Vec<Transaction>>> {
        let block = timeout(self.rpc_timeout, self.provider.get_block_with_txs(height))
            .await
            .with_context(|| format!("timed out fetching block {height}"))??;
        Ok(block.map(|b| b.transactions))
    }
}
