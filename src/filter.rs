use anyhow::{anyhow, Result};
use ethers_core::types::Transaction;
use ethers_core::utils::format_units;

use crate::domain::QualifiedTransfer;
use crate::price::UsdConverter;

/// Decides whether a transaction qualifies for activity tracking.
///
/// Returns `Ok(None)` for ordinary rejections (zero value, no recipient,
/// below the qualifying minimum) and `Err` only when the value cannot be
/// converted at all, so the caller can log the skip.
pub fn qualify(
    tx: &Transaction,
    converter: &UsdConverter,
    min_tx_value_usd: f64,
) -> Result<Option<QualifiedTransfer>> {
    if tx.value.is_zero() {
        return Ok(None);
    }
    let Some(recipient) = tx.to else {
        // Contract creation, no inbound wallet to credit.
        return Ok(None);
    };

    let value_eth: f64 = format_units(tx.value, "ether")
        .map_err(|e| anyhow!("cannot convert wei amount {}: {e}", tx.value))?
        .parse()
        .map_err(|e| anyhow!("unparseable ether amount for {}: {e}", tx.value))?;
    let value_usd = converter.to_usd(value_eth);

    if value_usd < min_tx_value_usd {
        return Ok(None);
    }

    Ok(Some(QualifiedTransfer {
        recipient,
        value_usd,
        tx_hash: tx.hash,
    }))
}
