//! Risk scoring primitives shared by the entity and transaction scorers:
//! factor categories, weights, tier bands, and reference data.
//!
//! Scoring is deterministic: identical inputs and identical reference data
//! always produce an identical assessment. Reference data is a versioned,
//! read-only snapshot supplied by the caller; an absent category simply
//! contributes nothing.

use crate::error::{AmlError, AmlResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FactorCategory {
    Geographic,
    Customer,
    Industry,
    Ownership,
    Transaction,
    Behavioral,
    Relationship,
}

impl fmt::Display for FactorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FactorCategory::Geographic => "geographic",
            FactorCategory::Customer => "customer",
            FactorCategory::Industry => "industry",
            FactorCategory::Ownership => "ownership",
            FactorCategory::Transaction => "transaction",
            FactorCategory::Behavioral => "behavioral",
            FactorCategory::Relationship => "relationship",
        };
        f.write_str(s)
    }
}

/// One contributing signal: a raw score in [0, 1], the category weight it
/// carries, and the human-readable reason it fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub category: FactorCategory,
    pub weight: f64,
    pub score: f64,
    pub rationale: String,
}

impl RiskFactor {
    pub fn contribution(&self) -> f64 {
        self.weight * self.score
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    VeryHigh,
    Prohibited,
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
            RiskTier::VeryHigh => "very_high",
            RiskTier::Prohibited => "prohibited",
        };
        f.write_str(s)
    }
}

impl RiskTier {
    /// Band boundaries are inclusive on the lower bound of the next tier.
    pub fn from_score(score: f64, bands: &TierBands) -> RiskTier {
        if score >= bands.prohibited {
            RiskTier::Prohibited
        } else if score >= bands.very_high {
            RiskTier::VeryHigh
        } else if score >= bands.high {
            RiskTier::High
        } else if score >= bands.medium {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }
}

/// Lower bounds of the medium and higher tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierBands {
    pub medium: f64,
    pub high: f64,
    pub very_high: f64,
    pub prohibited: f64,
}

impl Default for TierBands {
    fn default() -> Self {
        Self {
            medium: 0.25,
            high: 0.50,
            very_high: 0.75,
            prohibited: 0.90,
        }
    }
}

impl TierBands {
    pub fn validate(&self) -> AmlResult<()> {
        let bands = [self.medium, self.high, self.very_high, self.prohibited];
        if bands.iter().any(|b| !(0.0 < *b && *b < 1.0)) {
            return Err(AmlError::config("tier bands must be in (0, 1)"));
        }
        if bands.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AmlError::config("tier bands must be strictly ascending"));
        }
        Ok(())
    }
}

/// Fixed category weights for the weighted combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub geographic: f64,
    pub customer: f64,
    pub industry: f64,
    pub ownership: f64,
    pub transaction: f64,
    pub behavioral: f64,
    pub relationship: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            geographic: 0.20,
            customer: 0.25,
            industry: 0.10,
            ownership: 0.15,
            transaction: 0.15,
            behavioral: 0.10,
            relationship: 0.05,
        }
    }
}

impl CategoryWeights {
    pub fn get(&self, category: FactorCategory) -> f64 {
        match category {
            FactorCategory::Geographic => self.geographic,
            FactorCategory::Customer => self.customer,
            FactorCategory::Industry => self.industry,
            FactorCategory::Ownership => self.ownership,
            FactorCategory::Transaction => self.transaction,
            FactorCategory::Behavioral => self.behavioral,
            FactorCategory::Relationship => self.relationship,
        }
    }

    pub fn validate(&self) -> AmlResult<()> {
        let all = [
            self.geographic,
            self.customer,
            self.industry,
            self.ownership,
            self.transaction,
            self.behavioral,
            self.relationship,
        ];
        if all.iter().any(|w| *w < 0.0) {
            return Err(AmlError::config("category weights must be non-negative"));
        }
        Ok(())
    }
}

/// Versioned, read-only reference snapshot supplied by the reference-data
/// collaborator. The defaults are a built-in sample, not an authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReferenceData {
    pub version: String,
    pub high_risk_countries: BTreeSet<String>,
    pub medium_risk_countries: BTreeSet<String>,
    pub high_risk_industries: BTreeSet<String>,
    /// Industry codes too generic to describe a real operation; a shell
    /// indicator when a company carries one.
    pub generic_industry_codes: BTreeSet<String>,
    pub weights: CategoryWeights,
    pub tier_bands: TierBands,
}

impl Default for RiskReferenceData {
    fn default() -> Self {
        let set = |codes: &[&str]| codes.iter().map(|c| c.to_string()).collect();
        Self {
            version: "builtin-2026-01".to_string(),
            high_risk_countries: set(&["IR", "KP", "MM", "AF", "SY"]),
            medium_risk_countries: set(&["PA", "AE", "CY", "MT", "SC"]),
            // MSBs, casinos, precious metals, crypto exchanges.
            high_risk_industries: set(&["6199", "7995", "5094", "6051"]),
            generic_industry_codes: set(&["9999", "7389", "6719"]),
            weights: CategoryWeights::default(),
            tier_bands: TierBands::default(),
        }
    }
}

impl RiskReferenceData {
    pub fn validate(&self) -> AmlResult<()> {
        self.weights.validate()?;
        self.tier_bands.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Weighted combination of the factors, clamped to [0, 1].
    pub score: f64,
    pub tier: RiskTier,
    /// Contributing factors, highest weighted contribution first.
    pub factors: Vec<RiskFactor>,
    pub recommendations: Vec<String>,
    /// Enhanced due diligence required (tier high or above).
    pub requires_edd: bool,
}

/// Combine factor scores into an assessment. Factors are ordered by
/// weighted contribution; the overall score never exceeds 1.0.
pub(crate) fn assemble(mut factors: Vec<RiskFactor>, reference: &RiskReferenceData) -> RiskAssessment {
    let score: f64 = factors
        .iter()
        .map(RiskFactor::contribution)
        .sum::<f64>()
        .clamp(0.0, 1.0);
    factors.sort_by(|a, b| {
        b.contribution()
            .partial_cmp(&a.contribution())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });

    let tier = RiskTier::from_score(score, &reference.tier_bands);
    let recommendations = recommend(tier, factors.first());
    RiskAssessment {
        score,
        tier,
        factors,
        recommendations,
        requires_edd: tier >= RiskTier::High,
    }
}

/// Ranked actions keyed to the tier and to the top contributing factor.
fn recommend(tier: RiskTier, top_factor: Option<&RiskFactor>) -> Vec<String> {
    let mut actions: Vec<String> = Vec::new();
    match tier {
        RiskTier::Prohibited => {
            actions.push("terminate or decline the relationship".into());
            actions.push("escalate to compliance and consider filing a SAR".into());
        }
        RiskTier::VeryHigh => {
            actions.push("escalate to compliance".into());
            actions.push("apply enhanced due diligence before further activity".into());
        }
        RiskTier::High => {
            actions.push("apply enhanced due diligence".into());
        }
        RiskTier::Medium => {
            actions.push("schedule periodic review".into());
        }
        RiskTier::Low => {
            actions.push("continue standard monitoring".into());
        }
    }

    if let Some(factor) = top_factor {
        let followup = match factor.category {
            FactorCategory::Geographic => "review cross-border exposure and corridor activity",
            FactorCategory::Customer => "re-screen against current watchlists",
            FactorCategory::Industry => "verify the stated business purpose",
            FactorCategory::Ownership => "obtain beneficial ownership documentation",
            FactorCategory::Transaction => "review recent transaction activity in detail",
            FactorCategory::Behavioral => "compare activity against the customer's baseline",
            FactorCategory::Relationship => "review connected parties and their standing",
        };
        actions.push(followup.into());
    }
    actions
}
