//! Entity-level risk scoring: weighted factors across geography, customer
//! status, industry, ownership structure, transaction behaviour, and
//! relationship proximity.

use crate::error::AmlResult;
use crate::risk::{assemble, FactorCategory, RiskAssessment, RiskFactor, RiskReferenceData, RiskTier};
use crate::types::{Entity, EntityKind, Relationship, Transaction};
use crate::watchlist::WatchlistMatch;
use chrono::Duration;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

pub struct EntityRiskScorer {
    reference: RiskReferenceData,
}

impl EntityRiskScorer {
    pub fn new(reference: RiskReferenceData) -> AmlResult<Self> {
        reference.validate()?;
        Ok(Self { reference })
    }

    pub fn with_defaults() -> Self {
        Self {
            reference: RiskReferenceData::default(),
        }
    }

    pub fn reference(&self) -> &RiskReferenceData {
        &self.reference
    }

    /// Assess one entity against its transaction history, relationships,
    /// and screening results. Purely a function of its inputs.
    pub fn score(
        &self,
        entity: &Entity,
        transactions: &[Transaction],
        relationships: &[Relationship],
        watchlist_hits: &[WatchlistMatch],
    ) -> AmlResult<RiskAssessment> {
        let mut factors: Vec<RiskFactor> = Vec::new();

        if let Some(f) = self.geographic_factor(entity) {
            factors.push(f);
        }
        if let Some(f) = self.customer_factor(entity, watchlist_hits) {
            factors.push(f);
        }
        if let Some(f) = self.industry_factor(entity) {
            factors.push(f);
        }
        if let Some(f) = self.ownership_factor(entity, transactions) {
            factors.push(f);
        }
        if let Some(f) = self.transaction_factor(entity, transactions) {
            factors.push(f);
        }
        if let Some(f) = self.relationship_factor(relationships) {
            factors.push(f);
        }

        let assessment = assemble(factors, &self.reference);
        log::info!(
            "entity risk: entity={} score={:.3} tier={}",
            entity.id,
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

    fn geographic_factor(&self, entity: &Entity) -> Option<RiskFactor> {
        if self.reference.high_risk_countries.contains(&entity.country) {
            Some(self.factor(
                FactorCategory::Geographic,
                1.0,
                format!("{} is a high-risk jurisdiction", entity.country),
            ))
        } else if self.reference.medium_risk_countries.contains(&entity.country) {
            Some(self.factor(
                FactorCategory::Geographic,
                0.5,
                format!("{} is a medium-risk jurisdiction", entity.country),
            ))
        } else {
            None
        }
    }

    fn customer_factor(
        &self,
        entity: &Entity,
        watchlist_hits: &[WatchlistMatch],
    ) -> Option<RiskFactor> {
        let best_hit = watchlist_hits
            .iter()
            .map(|m| m.score)
            .fold(f64::NEG_INFINITY, f64::max);

        if entity.has_sanctions_hit {
            Some(self.factor(
                FactorCategory::Customer,
                1.0,
                "confirmed sanctions hit on file".into(),
            ))
        } else if entity.is_pep {
            Some(self.factor(
                FactorCategory::Customer,
                0.8,
                "politically exposed person".into(),
            ))
        } else if best_hit.is_finite() {
            Some(self.factor(
                FactorCategory::Customer,
                0.7 * best_hit,
                format!("watchlist hit with score {best_hit:.2}"),
            ))
        } else {
            None
        }
    }

    fn industry_factor(&self, entity: &Entity) -> Option<RiskFactor> {
        let code = entity.industry_code.as_deref()?;
        if self.reference.high_risk_industries.contains(code) {
            Some(self.factor(
                FactorCategory::Industry,
                1.0,
                format!("industry code {code} is high risk"),
            ))
        } else {
            None
        }
    }

    /// Shell-company structural indicators. The most recent transaction
    /// timestamp serves as the as-of date so the result stays a pure
    /// function of the inputs.
    fn ownership_factor(&self, entity: &Entity, transactions: &[Transaction]) -> Option<RiskFactor> {
        if entity.kind != EntityKind::Company {
            return None;
        }

        let mut score: f64 = 0.0;
        let mut indicators: Vec<&str> = Vec::new();

        if entity.employee_count == Some(0) {
            score += 0.35;
            indicators.push("no employees");
        }
        if let Some(code) = entity.industry_code.as_deref() {
            if self.reference.generic_industry_codes.contains(code) {
                score += 0.35;
                indicators.push("generic industry code");
            }
        }
        let as_of = transactions.iter().map(|t| t.timestamp).max();
        if let (Some(formed), Some(as_of)) = (entity.formed_at, as_of) {
            if as_of - formed < Duration::days(365) {
                score += 0.35;
                indicators.push("formed within the last year");
            }
        }

        if indicators.is_empty() {
            None
        } else {
            Some(self.factor(
                FactorCategory::Ownership,
                score.min(1.0),
                format!("shell indicators: {}", indicators.join(", ")),
            ))
        }
    }

    /// Volume, velocity, and round-amount signals over the supplied
    /// history.
    fn transaction_factor(&self, entity: &Entity, transactions: &[Transaction]) -> Option<RiskFactor> {
        let own: Vec<&Transaction> = transactions
            .iter()
            .filter(|t| t.sender_id == entity.id || t.receiver_id == entity.id)
            .collect();
        if own.is_empty() {
            return None;
        }

        let total: Decimal = own.iter().map(|t| t.amount).sum();
        let volume = (total / Decimal::from(1_000_000))
            .to_f64()
            .unwrap_or(0.0)
            .min(1.0);
        let velocity = (own.len() as f64 / 50.0).min(1.0);
        let round = own
            .iter()
            .filter(|t| t.amount > Decimal::ZERO && t.amount % Decimal::from(1_000) == Decimal::ZERO)
            .count() as f64
            / own.len() as f64;

        let score = 0.4 * volume + 0.3 * velocity + 0.3 * round;
        if score <= 0.0 {
            return None;
        }
        Some(self.factor(
            FactorCategory::Transaction,
            score,
            format!(
                "{} transactions totaling {total}, {:.0}% round amounts",
                own.len(),
                round * 100.0
            ),
        ))
    }

    /// Proximity to counterparties already assessed as risky.
    fn relationship_factor(&self, relationships: &[Relationship]) -> Option<RiskFactor> {
        let worst = relationships
            .iter()
            .filter_map(|r| r.counterparty_tier)
            .max()?;
        let (score, label) = match worst {
            RiskTier::Prohibited => (1.0, "prohibited"),
            RiskTier::VeryHigh => (0.8, "very high risk"),
            RiskTier::High => (0.5, "high risk"),
            _ => return None,
        };
        Some(self.factor(
            FactorCategory::Relationship,
            score,
            format!("directly connected to a {label} counterparty"),
        ))
    }
}
