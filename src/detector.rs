use chrono::{DateTime, Duration, Utc};

use crate::domain::{Decision, SuppressReason, SurgeKind};

/// Threshold and cooldown policy. Pure decision logic: the caller owns the
/// store and applies `mark_alerted` only after a dispatch succeeds.
#[derive(Debug, Clone, Copy)]
pub struct SurgeDetector {
    threshold_usd: f64,
    cooldown: Duration,
}

impl SurgeDetector {
    pub fn new(threshold_usd: f64, cooldown: Duration) -> Self {
        Self {
            threshold_usd,
            cooldown,
        }
    }

    pub fn evaluate(
        &self,
        windowed_total_usd: f64,
        last_alert: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Decision {
        if windowed_total_usd < self.threshold_usd {
            return Decision::Suppress(SuppressReason::BelowThreshold);
        }
        match last_alert {
            Some(prev) if now - prev < self.cooldown => {
                Decision::Suppress(SuppressReason::CooldownActive)
            }
            _ => Decision::Fire(SurgeKind::Capital),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SurgeDetector;
    use crate::activity::WalletActivityStore;
    use crate::domain::{Decision, SuppressReason, SurgeKind};
    use chrono::{Duration, TimeZone, Utc};

    fn detector() -> SurgeDetector {
        SurgeDetector::new(100_000.0, Duration::hours(1))
    }

    fn t0() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn fires_at_exactly_the_threshold_with_no_prior_alert() {
        assert_eq!(
            detector().evaluate(100_000.0, None, t0()),
            Decision::Fire(SurgeKind::Capital)
        );
    }

    #[test]
    fn suppresses_below_threshold() {
        assert_eq!(
            detector().evaluate(99_999.99, None, t0()),
            Decision::Suppress(SuppressReason::BelowThreshold)
        );
    }

    #[test]
    fn suppresses_while_cooldown_is_active() {
        let last = Some(t0());
        assert_eq!(
            detector().evaluate(250_000.0, last, t0() + Duration::minutes(30)),
            Decision::Suppress(SuppressReason::CooldownActive)
        );
    }

    #[test]
    fn fires_again_once_cooldown_has_elapsed() {
        let last = Some(t0());
        assert_eq!(
            detector().evaluate(250_000.0, last, t0() + Duration::hours(1)),
            Decision::Fire(SurgeKind::Capital)
        );
    }

    #[test]
    fn at_most_one_fire_within_a_cooldown() {
        let detector = detector();
        let first = detector.evaluate(150_000.0, None, t0());
        assert_eq!(first, Decision::Fire(SurgeKind::Capital));

        // The dispatch succeeded, so the alert timestamp was recorded.
        let alerted_at = Some(t0());
        let second = detector.evaluate(200_000.0, alerted_at, t0() + Duration::minutes(20));
        assert_eq!(second, Decision::Suppress(SuppressReason::CooldownActive));
    }

    // The end-to-end scenario from the detection policy: $100k threshold,
    // 1h window, three $40k transfers ten minutes apart, a fourth during
    // cooldown, then a fresh transfer after the window has emptied.
    #[test]
    fn capital_surge_scenario() {
        let detector = detector();
        let mut store = WalletActivityStore::new(Duration::hours(1), Duration::hours(24));
        let wallet = "0xF977814e90dA44bFA03b6295A0616a897441aceC";

        let mut total = store.record(wallet, 40_000.0, "0x1", t0());
        assert_eq!(
            detector.evaluate(total, store.last_alert(wallet), t0()),
            Decision::Suppress(SuppressReason::BelowThreshold)
        );

        let at_10m = t0() + Duration::minutes(10);
        total = store.record(wallet, 40_000.0, "0x2", at_10m);
        assert_eq!(
            detector.evaluate(total, store.last_alert(wallet), at_10m),
            Decision::Suppress(SuppressReason::BelowThreshold)
        );

        let at_20m = t0() + Duration::minutes(20);
        total = store.record(wallet, 40_000.0, "0x3", at_20m);
        assert_eq!(total, 120_000.0);
        assert_eq!(
            detector.evaluate(total, store.last_alert(wallet), at_20m),
            Decision::Fire(SurgeKind::Capital)
        );
        store.mark_alerted(wallet, at_20m);

        let at_30m = t0() + Duration::minutes(30);
        total = store.record(wallet, 50_000.0, "0x4", at_30m);
        assert_eq!(
            detector.evaluate(total, store.last_alert(wallet), at_30m),
            Decision::Suppress(SuppressReason::CooldownActive)
        );

        // 61 minutes after the last transfer every earlier transfer has
        // expired, so the new one stands alone below the threshold.
        let at_91m = t0() + Duration::minutes(91);
        total = store.record(wallet, 40_000.0, "0x5", at_91m);
        assert_eq!(total, 40_000.0);
        assert_eq!(
            detector.evaluate(total, store.last_alert(wallet), at_91m),
            Decision::Suppress(SuppressReason::BelowThreshold)
        );
    }
}
