//! Structuring detection: bursts of transactions priced just under the
//! regulatory reporting threshold.
//!
//! A sender whose transactions sit in the 95%-100% band below the
//! threshold, with enough of them inside one rolling window to push the
//! sum over the threshold, is deliberately splitting a larger transfer.

use crate::config::StructuringConfig;
use crate::detector::PatternDetector;
use crate::error::{AmlError, AmlResult};
use crate::types::{Amount, PatternKind, PatternMatch, Severity, Transaction};
use chrono::Duration;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
pub struct Structuring {
    config: StructuringConfig,
}

impl Structuring {
    pub fn new(config: StructuringConfig) -> AmlResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StructuringConfig {
        &self.config
    }

    /// Skips validation so detection-time failures can be exercised.
    #[cfg(test)]
    pub(crate) fn unvalidated(config: StructuringConfig) -> Self {
        Self { config }
    }

    fn severity(&self, total: Amount, count: usize) -> Severity {
        let threshold = self.config.reporting_threshold;
        if total >= threshold * Decimal::from(5) || count >= 10 {
            Severity::Critical
        } else if total >= threshold * Decimal::from(3) || count >= 7 {
            Severity::High
        } else if total >= threshold * Decimal::from(2) || count >= 5 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Linear in count and in total-over-threshold, capped at 0.99.
    fn confidence(&self, total: Amount, count: usize) -> f64 {
        let ratio = (total / self.config.reporting_threshold)
            .to_f64()
            .unwrap_or(1.0);
        let raw = 0.5
            + 0.05 * (count.saturating_sub(self.config.min_count)) as f64
            + 0.1 * (ratio - 1.0).max(0.0);
        raw.clamp(0.0, 0.99)
    }

    fn emit(&self, sender: &str, cluster: &[&Transaction]) -> PatternMatch {
        let total: Amount = cluster.iter().map(|t| t.amount).sum();
        let count = cluster.len();
        let severity = self.severity(total, count);
        let confidence = self.confidence(total, count);

        let mut entities = BTreeSet::new();
        entities.insert(sender.to_string());
        for t in cluster {
            entities.insert(t.receiver_id.clone());
        }

        log::warn!(
            "structuring: sender={} count={} total={} severity={}",
            sender,
            count,
            total,
            severity
        );

        PatternMatch {
            pattern: PatternKind::Structuring,
            severity,
            confidence,
            description: format!(
                "{count} transactions totaling {total} just under the {} reporting \
                 threshold within {} days",
                self.config.reporting_threshold, self.config.lookback_days
            ),
            entities,
            transactions: cluster.iter().map(|t| t.id.clone()).collect(),
            total_amount: total,
            currency: cluster[0].currency.clone(),
            window_start: cluster[0].timestamp,
            window_end: cluster[count - 1].timestamp,
            details: serde_json::json!({
                "sender": sender,
                "count": count,
                "reporting_threshold": self.config.reporting_threshold,
                "lookback_days": self.config.lookback_days,
            }),
        }
    }
}

impl PatternDetector for Structuring {
    fn name(&self) -> &'static str {
        "structuring"
    }

    /// Aggregate reported per match: sum of the clustered transactions.
    fn detect(&self, transactions: &[Transaction]) -> AmlResult<Vec<PatternMatch>> {
        let band_floor = self.config.reporting_threshold
            * Decimal::from_f64(self.config.band_fraction)
                .ok_or_else(|| AmlError::config("band_fraction is not representable"))?;
        let lookback = Duration::days(self.config.lookback_days);

        // Group the in-band transactions by sender.
        let mut by_sender: HashMap<&str, Vec<&Transaction>> = HashMap::new();
        for txn in crate::types::chronological(transactions) {
            if txn.amount >= band_floor && txn.amount < self.config.reporting_threshold {
                by_sender.entry(txn.sender_id.as_str()).or_default().push(txn);
            }
        }

        let mut senders: Vec<&str> = by_sender.keys().copied().collect();
        senders.sort_unstable();

        let mut matches = Vec::new();
        for sender in senders {
            let txns = &by_sender[sender];

            // Slide a window; overlapping qualifying windows collapse into
            // one maximal cluster so a single burst yields a single match.
            let mut cluster: Option<(usize, usize)> = None;
            let mut lo = 0usize;
            for hi in 0..txns.len() {
                while txns[hi].timestamp - txns[lo].timestamp > lookback {
                    lo += 1;
                }
                let count = hi - lo + 1;
                let sum: Amount = txns[lo..=hi].iter().map(|t| t.amount).sum();
                if count >= self.config.min_count && sum > self.config.reporting_threshold {
                    cluster = match cluster {
                        Some((start, end)) if lo <= end + 1 => Some((start, hi)),
                        Some((start, end)) => {
                            matches.push(self.emit(sender, &txns[start..=end]));
                            Some((lo, hi))
                        }
                        None => Some((lo, hi)),
                    };
                }
            }
            if let Some((start, end)) = cluster {
                matches.push(self.emit(sender, &txns[start..=end]));
            }
        }

        Ok(matches)
    }
}
