//! Transaction-level risk scoring: amount tiers and instrument risk as
//! primary signals, party risk from both sides, and deviation from the
//! sender's own baseline.

use crate::config::AmountTiers;
use crate::error::AmlResult;
use crate::risk::{assemble, FactorCategory, RiskAssessment, RiskFactor, RiskReferenceData};
use crate::types::{Entity, Transaction, TransactionKind};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

pub struct TransactionRiskScorer {
    reference: RiskReferenceData,
    tiers: AmountTiers,
}

impl TransactionRiskScorer {
    pub fn new(reference: RiskReferenceData, tiers: AmountTiers) -> AmlResult<Self> {
        reference.validate()?;
        tiers.validate()?;
        Ok(Self { reference, tiers })
    }

    pub fn with_defaults() -> Self {
        Self {
            reference: RiskReferenceData::default(),
            tiers: AmountTiers::default(),
        }
    }

    /// Assess a single transaction between two known parties, with the
    /// sender's recent history as baseline. Deterministic for identical
    /// inputs and reference data.
    pub fn score(
        &self,
        transaction: &Transaction,
        sender: &Entity,
        receiver: &Entity,
        sender_history: &[Transaction],
    ) -> AmlResult<RiskAssessment> {
        transaction.validate()?;

        let mut factors: Vec<RiskFactor> = Vec::new();
        factors.push(self.transaction_factor(transaction));
        if let Some(f) = self.geographic_factor(sender, receiver) {
            factors.push(f);
        }
        if let Some(f) = self.party_factor(sender, receiver) {
            factors.push(f);
        }
        if let Some(f) = self.baseline_factor(transaction, sender_history) {
            factors.push(f);
        }

        let assessment = assemble(factors, &self.reference);
        log::info!(
            "transaction risk: txn={} amount={} score={:.3} tier={}",
            transaction.id,
            transaction.amount,
            assessment.score,
            assessment.tier
        );
        Ok(assessment)
    }

    fn factor(&self, category: FactorCategory, score: f64, rationale: String) -> RiskFactor {
        RiskFactor {
            category,
            weight: self.reference.weights.get(category),
            score,
            rationale,
        }
    }

    /// Amount tier plus instrument risk, combined into one factor.
    fn transaction_factor(&self, transaction: &Transaction) -> RiskFactor {
        let (tier_score, tier_label): (f64, &str) = if transaction.amount >= self.tiers.critical {
            (1.0, "critical")
        } else if transaction.amount >= self.tiers.very_high {
            (0.8, "very high")
        } else if transaction.amount >= self.tiers.high {
            (0.6, "high")
        } else if transaction.amount >= self.tiers.medium {
            (0.3, "medium")
        } else {
            (0.1, "low")
        };

        let instrument_bonus = match transaction.kind {
            TransactionKind::Crypto => 0.35,
            TransactionKind::Cash => 0.30,
            TransactionKind::InternationalWire => 0.25,
            TransactionKind::MoneyOrder => 0.20,
            _ => 0.0,
        };

        let mut rationale = format!(
            "amount {} falls in the {tier_label} tier",
            transaction.amount
        );
        if instrument_bonus > 0.0 {
            rationale.push_str(&format!(", high-risk instrument ({:?})", transaction.kind));
        }

        self.factor(
            FactorCategory::Transaction,
            (tier_score + instrument_bonus).min(1.0),
            rationale,
        )
    }

    fn geographic_factor(&self, sender: &Entity, receiver: &Entity) -> Option<RiskFactor> {
        let rate = |country: &String| {
            if self.reference.high_risk_countries.contains(country) {
                1.0
            } else if self.reference.medium_risk_countries.contains(country) {
                0.5
            } else {
                0.0
            }
        };
        let sender_score: f64 = rate(&sender.country);
        let receiver_score = rate(&receiver.country);
        let score = sender_score.max(receiver_score);
        if score <= 0.0 {
            return None;
        }
        let side = if sender_score >= receiver_score {
            format!("sender in {}", sender.country)
        } else {
            format!("receiver in {}", receiver.country)
        };
        Some(self.factor(
            FactorCategory::Geographic,
            score,
            format!("{side}, an elevated-risk jurisdiction"),
        ))
    }

    fn party_factor(&self, sender: &Entity, receiver: &Entity) -> Option<RiskFactor> {
        for (party, label) in [(sender, "sender"), (receiver, "receiver")] {
            if party.has_sanctions_hit {
                return Some(self.factor(
                    FactorCategory::Customer,
                    1.0,
                    format!("{label} has a confirmed sanctions hit"),
                ));
            }
        }
        for (party, label) in [(sender, "sender"), (receiver, "receiver")] {
            if party.is_pep {
                return Some(self.factor(
                    FactorCategory::Customer,
                    0.8,
                    format!("{label} is a politically exposed person"),
                ));
            }
        }
        None
    }

    /// Deviation from the sender's own baseline: fires when the amount is
    /// at least three times the historical mean, scaled by the multiple.
    fn baseline_factor(
        &self,
        transaction: &Transaction,
        sender_history: &[Transaction],
    ) -> Option<RiskFactor> {
        if sender_history.len() < 3 {
            return None;
        }
        let total: Decimal = sender_history.iter().map(|t| t.amount).sum();
        let mean = total / Decimal::from(sender_history.len() as i64);
        if mean <= Decimal::ZERO {
            return None;
        }
        let ratio = (transaction.amount / mean).to_f64().unwrap_or(0.0);
        if ratio < 3.0 {
            return None;
        }
        Some(self.factor(
            FactorCategory::Behavioral,
            (ratio / 10.0).min(1.0),
            format!(
                "amount is {ratio:.1}x the sender's baseline mean of {mean}"
            ),
        ))
    }
}
