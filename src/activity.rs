use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

/// One qualifying inbound transfer as seen by the tracker. Never mutated
/// after creation; dropped when it ages out of the window.
#[derive(Debug, Clone)]
pub struct TransferRecord {
    pub value_usd: f64,
    pub observed_at: DateTime<Utc>,
    pub tx_hash: String,
}

/// Diagnostic counters for one tracked wallet. The all-time values only
/// ever grow and play no part in alerting decisions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalletStats {
    pub total_received_usd: f64,
    pub transfer_count: u64,
    pub transfers_in_window: usize,
}

#[derive(Debug, Default)]
struct WalletActivity {
    total_received_usd: f64,
    transfer_count: u64,
    recent: Vec<TransferRecord>,
    last_alert: Option<DateTime<Utc>>,
}

/// Per-address sliding-window ledger of recent inbound transfers.
///
/// Keys are lowercased addresses; callers pass whatever display form they
/// have. The window is re-pruned on every touch rather than on a timer,
/// and stale addresses are swept out as part of `record` to bound memory.
#[derive(Debug)]
pub struct WalletActivityStore {
    window: Duration,
    retention_horizon: Duration,
    wallets: HashMap<String, WalletActivity>,
    last_sweep: Option<DateTime<Utc>>,
}

/// Full-map sweeps are amortized into `record` calls, at most this often.
const SWEEP_INTERVAL_SECS: i64 = 60;

impl WalletActivityStore {
    pub fn new(window: Duration, retention_horizon: Duration) -> Self {
        Self {
            window,
            retention_horizon,
            wallets: HashMap::new(),
            last_sweep: None,
        }
    }

    /// Appends a transfer for `address` and returns the USD total of all
    /// transfers still inside the window as of `now`.
    pub fn record(
        &mut self,
        address: &str,
        value_usd: f64,
        tx_hash: &str,
        now: DateTime<Utc>,
    ) -> f64 {
        let key = normalize(address);
        let activity = self.wallets.entry(key).or_default();

        activity.recent.push(TransferRecord {
            value_usd,
            observed_at: now,
            tx_hash: tx_hash.to_string(),
        });
        activity.total_received_usd += value_usd;
        activity.transfer_count += 1;

        let window_start = now - self.window;
        activity.recent.retain(|t| t.observed_at > window_start);
        let windowed_total = activity.recent.iter().map(|t| t.value_usd).sum();

        if self
            .last_sweep
            .map_or(true, |t| now - t >= Duration::seconds(SWEEP_INTERVAL_SECS))
        {
            self.sweep(now);
            self.last_sweep = Some(now);
        }

        windowed_total
    }

    /// Records a successfully dispatched alert. The timestamp only ever
    /// advances; a stale `now` is ignored.
    pub fn mark_alerted(&mut self, address: &str, now: DateTime<Utc>) {
        if let Some(activity) = self.wallets.get_mut(&normalize(address)) {
            if activity.last_alert.map_or(true, |prev| now > prev) {
                activity.last_alert = Some(now);
            }
        }
    }

    pub fn last_alert(&self, address: &str) -> Option<DateTime<Utc>> {
        self.wallets
            .get(&normalize(address))
            .and_then(|a| a.last_alert)
    }

    pub fn stats(&self, address: &str) -> Option<WalletStats> {
        self.wallets.get(&normalize(address)).map(|a| WalletStats {
            total_received_usd: a.total_received_usd,
            transfer_count: a.transfer_count,
            transfers_in_window: a.recent.len(),
        })
    }

    /// Drops every address with no transfer newer than the retention
    /// horizon, bounding memory across quiet periods.
    pub fn sweep(&mut self, now: DateTime<Utc>) {
        let horizon = now - self.retention_horizon;
        self.wallets.retain(|_, activity| {
            activity
                .recent
                .last()
                .is_some_and(|newest| newest.observed_at >= horizon)
        });
    }

    pub fn tracked_wallets(&self) -> usize {
        self.wallets.len()
    }
}

fn normalize(address: &str) -> String {
    address.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::WalletActivityStore;
    use chrono::{Duration, TimeZone, Utc};

    const ADDR: &str = "0xF977814e90dA44bFA03b6295A0616a897441aceC";

    fn store() -> WalletActivityStore {
        WalletActivityStore::new(Duration::hours(1), Duration::hours(24))
    }

    fn t0() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn windowed_total_sums_only_transfers_inside_window() {
        let mut store = store();
        assert_eq!(store.record(ADDR, 40_000.0, "0xa", t0()), 40_000.0);
        assert_eq!(
            store.record(ADDR, 40_000.0, "0xb", t0() + Duration::minutes(10)),
            80_000.0
        );
        assert_eq!(
            store.record(ADDR, 40_000.0, "0xc", t0() + Duration::minutes(20)),
            120_000.0
        );

        // 61 minutes after the first three, they have all aged out.
        let late = t0() + Duration::minutes(81);
        assert_eq!(store.record(ADDR, 40_000.0, "0xd", late), 40_000.0);
    }

    #[test]
    fn transfer_exactly_window_old_no_longer_counts() {
        let mut store = store();
        store.record(ADDR, 40_000.0, "0xa", t0());

        // The prune keeps strictly-newer transfers only, so at exactly
        // one window later the first transfer is out.
        let total = store.record(ADDR, 50_000.0, "0xb", t0() + Duration::hours(1));
        assert_eq!(total, 50_000.0);

        // One second inside the boundary still counts.
        let mut store = self::store();
        store.record(ADDR, 40_000.0, "0xa", t0());
        let total = store.record(
            ADDR,
            50_000.0,
            "0xb",
            t0() + Duration::hours(1) - Duration::seconds(1),
        );
        assert_eq!(total, 90_000.0);
    }

    #[test]
    fn keys_are_case_insensitive() {
        let mut store = store();
        store.record(&ADDR.to_uppercase(), 10_000.0, "0xa", t0());
        let total = store.record(&ADDR.to_lowercase(), 5_000.0, "0xb", t0());
        assert_eq!(total, 15_000.0);
        assert_eq!(store.tracked_wallets(), 1);
    }

    #[test]
    fn sweep_evicts_addresses_past_retention_horizon() {
        let mut store = store();
        store.record("0xaaa", 20_000.0, "0x1", t0());
        store.record("0xbbb", 20_000.0, "0x2", t0() + Duration::hours(23));

        store.sweep(t0() + Duration::hours(25));
        assert_eq!(store.tracked_wallets(), 1);
        assert!(store.last_alert("0xbbb").is_none());

        store.sweep(t0() + Duration::hours(48));
        assert_eq!(store.tracked_wallets(), 0);
    }

    #[test]
    fn record_amortizes_the_sweep() {
        let mut store = store();
        store.record("0xaaa", 20_000.0, "0x1", t0());
        // A write a day later should sweep the stale address out as a side
        // effect, without an explicit sweep call.
        store.record("0xbbb", 20_000.0, "0x2", t0() + Duration::hours(25));
        assert_eq!(store.tracked_wallets(), 1);
    }

    #[test]
    fn all_time_counters_survive_window_expiry() {
        let mut store = store();
        store.record(ADDR, 40_000.0, "0xa", t0());
        store.record(ADDR, 40_000.0, "0xb", t0() + Duration::hours(2));

        let stats = store.stats(ADDR).unwrap();
        assert_eq!(stats.total_received_usd, 80_000.0);
        assert_eq!(stats.transfer_count, 2);
        assert_eq!(stats.transfers_in_window, 1, "first transfer aged out");
    }

    #[test]
    fn last_alert_only_advances() {
        let mut store = store();
        store.record(ADDR, 150_000.0, "0xa", t0());

        assert!(store.last_alert(ADDR).is_none());
        store.mark_alerted(ADDR, t0());
        assert_eq!(store.last_alert(ADDR), Some(t0()));

        store.mark_alerted(ADDR, t0() - Duration::minutes(5));
        assert_eq!(store.last_alert(ADDR), Some(t0()));

        let later = t0() + Duration::minutes(90);
        store.mark_alerted(ADDR, later);
        assert_eq!(store.last_alert(ADDR), Some(later));
    }

    #[test]
    fn mark_alerted_for_unknown_address_is_a_noop() {
        let mut store = store();
        store.mark_alerted("0xdead", t0());
        assert!(store.last_alert("0xdead").is_none());
        assert_eq!(store.tracked_wallets(), 0);
    }
}
