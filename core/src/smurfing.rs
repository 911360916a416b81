//! Smurfing detection: one receiver accumulating deposits from many
//! distinct senders inside a rolling window.

use crate::config::SmurfingConfig;
use crate::detector::PatternDetector;
use crate::error::AmlResult;
use crate::types::{Amount, PatternKind, PatternMatch, Severity, Transaction};
use chrono::Duration;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct Smurfing {
    config: SmurfingConfig,
}

impl Smurfing {
    pub fn new(config: SmurfingConfig) -> AmlResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SmurfingConfig {
        &self.config
    }

    fn severity(&self, total: Amount, senders: usize) -> Severity {
        if total >= self.config.min_total * Decimal::from(5) || senders >= 10 {
            Severity::Critical
        } else if total >= self.config.min_total * Decimal::from(3) || senders >= 7 {
            Severity::High
        } else if total >= self.config.min_total * Decimal::from(2) || senders >= 5 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Linear in distinct-sender count and aggregate, capped at 0.99.
    fn confidence(&self, total: Amount, senders: usize) -> f64 {
        let ratio = (total / self.config.min_total).to_f64().unwrap_or(1.0);
        let raw = 0.5
            + 0.05 * (senders.saturating_sub(self.config.min_senders)) as f64
            + 0.1 * (ratio - 1.0).max(0.0);
        raw.clamp(0.0, 0.99)
    }

    fn emit(&self, receiver: &str, cluster: &[&Transaction]) -> PatternMatch {
        let total: Amount = cluster.iter().map(|t| t.amount).sum();
        let senders: HashSet<&str> = cluster.iter().map(|t| t.sender_id.as_str()).collect();
        let severity = self.severity(total, senders.len());
        let confidence = self.confidence(total, senders.len());

        let mut entities: BTreeSet<String> = senders.iter().map(|s| s.to_string()).collect();
        entities.insert(receiver.to_string());

        log::warn!(
            "smurfing: receiver={} senders={} total={} severity={}",
            receiver,
            senders.len(),
            total,
            severity
        );

        PatternMatch {
            pattern: PatternKind::Smurfing,
            severity,
            confidence,
            description: format!(
                "{} deposits from {} distinct senders totaling {total} within {} days",
                cluster.len(),
                senders.len(),
                self.config.window_days
            ),
            entities,
            transactions: cluster.iter().map(|t| t.id.clone()).collect(),
            total_amount: total,
            currency: cluster[0].currency.clone(),
            window_start: cluster[0].timestamp,
            window_end: cluster[cluster.len() - 1].timestamp,
            details: serde_json::json!({
                "receiver": receiver,
                "distinct_senders": senders.len(),
                "window_days": self.config.window_days,
            }),
        }
    }
}

impl PatternDetector for Smurfing {
    fn name(&self) -> &'static str {
        "smurfing"
    }

    /// Aggregate reported per match: sum of the clustered deposits.
    fn detect(&self, transactions: &[Transaction]) -> AmlResult<Vec<PatternMatch>> {
        let window = Duration::days(self.config.window_days);

        let mut by_receiver: HashMap<&str, Vec<&Transaction>> = HashMap::new();
        for txn in crate::types::chronological(transactions) {
            by_receiver
                .entry(txn.receiver_id.as_str())
                .or_default()
                .push(txn);
        }

        let mut receivers: Vec<&str> = by_receiver.keys().copied().collect();
        receivers.sort_unstable();

        let mut matches = Vec::new();
        for receiver in receivers {
            let txns = &by_receiver[receiver];

            let mut cluster: Option<(usize, usize)> = None;
            let mut lo = 0usize;
            for hi in 0..txns.len() {
                while txns[hi].timestamp - txns[lo].timestamp > window {
                    lo += 1;
                }
                let distinct: HashSet<&str> =
                    txns[lo..=hi].iter().map(|t| t.sender_id.as_str()).collect();
                let sum: Amount = txns[lo..=hi].iter().map(|t| t.amount).sum();
                if distinct.len() >= self.config.min_senders && sum >= self.config.min_total {
                    cluster = match cluster {
                        Some((start, end)) if lo <= end + 1 => Some((start, hi)),
                        Some((start, end)) => {
                            matches.push(self.emit(receiver, &txns[start..=end]));
                            Some((lo, hi))
                        }
                        None => Some((lo, hi)),
                    };
                }
            }
            if let Some((start, end)) = cluster {
                matches.push(self.emit(receiver, &txns[start..=end]));
            }
        }

        Ok(matches)
    }
}
