//! Rapid movement detection: a large deposit followed almost immediately
//! by a withdrawal of most of it. Classic pass-through behaviour.

use crate::config::RapidMovementConfig;
use crate::detector::PatternDetector;
use crate::error::{AmlError, AmlResult};
use crate::types::{PatternKind, PatternMatch, Severity, Transaction};
use chrono::Duration;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
pub struct RapidMovement {
    config: RapidMovementConfig,
}

impl RapidMovement {
    pub fn new(config: RapidMovementConfig) -> AmlResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RapidMovementConfig {
        &self.config
    }

    /// Bands keyed jointly on deposit amount and elapsed time; the worse
    /// of the two wins.
    fn severity(&self, deposit: Decimal, gap: Duration) -> Severity {
        if deposit >= Decimal::from(1_000_000) || gap <= Duration::hours(2) {
            Severity::Critical
        } else if deposit >= Decimal::from(500_000) || gap <= Duration::hours(6) {
            Severity::High
        } else if deposit >= Decimal::from(250_000) || gap <= Duration::hours(12) {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Rises with the moved fraction and with tighter timing.
    fn confidence(&self, moved_fraction: f64, gap: Duration, max_gap: Duration) -> f64 {
        let tightness = 1.0 - gap.num_seconds() as f64 / max_gap.num_seconds() as f64;
        (0.5 + 0.25 * moved_fraction.min(1.0) + 0.25 * tightness).clamp(0.0, 0.99)
    }

    fn emit(&self, entity: &str, deposit: &Transaction, withdrawal: &Transaction) -> PatternMatch {
        let gap = withdrawal.timestamp - deposit.timestamp;
        let max_gap = Duration::hours(self.config.max_gap_hours);
        let moved_fraction = (withdrawal.amount / deposit.amount).to_f64().unwrap_or(0.0);
        let severity = self.severity(deposit.amount, gap);
        let total = deposit.amount + withdrawal.amount;

        log::warn!(
            "rapid_movement: entity={} deposit={} withdrawal={} gap_minutes={} severity={}",
            entity,
            deposit.amount,
            withdrawal.amount,
            gap.num_minutes(),
            severity
        );

        let mut entities = BTreeSet::new();
        entities.insert(entity.to_string());
        entities.insert(deposit.sender_id.clone());
        entities.insert(withdrawal.receiver_id.clone());

        PatternMatch {
            pattern: PatternKind::RapidMovement,
            severity,
            confidence: self.confidence(moved_fraction, gap, max_gap),
            description: format!(
                "Deposit of {} followed by withdrawal of {} ({:.0}%) after {} hours",
                deposit.amount,
                withdrawal.amount,
                moved_fraction * 100.0,
                gap.num_hours()
            ),
            entities,
            transactions: [deposit.id.clone(), withdrawal.id.clone()]
                .into_iter()
                .collect(),
            total_amount: total,
            currency: deposit.currency.clone(),
            window_start: deposit.timestamp,
            window_end: withdrawal.timestamp,
            details: serde_json::json!({
                "entity": entity,
                "deposit_amount": deposit.amount,
                "withdrawal_amount": withdrawal.amount,
                "gap_minutes": gap.num_minutes(),
            }),
        }
    }
}

impl PatternDetector for RapidMovement {
    fn name(&self) -> &'static str {
        "rapid_movement"
    }

    /// Aggregate reported per match: deposit plus withdrawal.
    fn detect(&self, transactions: &[Transaction]) -> AmlResult<Vec<PatternMatch>> {
        let fraction = Decimal::from_f64(self.config.min_outflow_fraction)
            .ok_or_else(|| AmlError::config("min_outflow_fraction is not representable"))?;
        let max_gap = Duration::hours(self.config.max_gap_hours);

        let sorted = crate::types::chronological(transactions);
        let mut inbound: HashMap<&str, Vec<&Transaction>> = HashMap::new();
        let mut outbound: HashMap<&str, Vec<&Transaction>> = HashMap::new();
        for txn in &sorted {
            inbound.entry(txn.receiver_id.as_str()).or_default().push(txn);
            outbound.entry(txn.sender_id.as_str()).or_default().push(txn);
        }

        let mut entities: Vec<&str> = inbound.keys().copied().collect();
        entities.sort_unstable();

        let mut matches = Vec::new();
        for entity in entities {
            let Some(out) = outbound.get(entity) else {
                continue;
            };
            let mut used = vec![false; out.len()];

            for deposit in &inbound[entity] {
                if deposit.amount < self.config.min_amount {
                    continue;
                }
                let required = deposit.amount * fraction;
                let found = out.iter().enumerate().find(|(i, w)| {
                    !used[*i]
                        && w.timestamp > deposit.timestamp
                        && w.timestamp - deposit.timestamp <= max_gap
                        && w.amount >= required
                });
                if let Some((i, withdrawal)) = found {
                    used[i] = true;
                    matches.push(self.emit(entity, deposit, withdrawal));
                }
            }
        }

        Ok(matches)
    }
}
