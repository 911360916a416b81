//! Entity and transaction risk scoring tests: factor assembly, tier
//! boundaries, determinism, and enhanced-due-diligence triggering.

use chrono::{DateTime, Duration, TimeZone, Utc};
use fintel_core::config::AmountTiers;
use fintel_core::entity_risk::EntityRiskScorer;
use fintel_core::risk::{FactorCategory, RiskReferenceData, RiskTier, TierBands};
use fintel_core::transaction_risk::TransactionRiskScorer;
use fintel_core::types::{Entity, EntityKind, Relationship, RelationshipKind, Transaction, TransactionKind};
use rust_decimal::Decimal;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

fn person(id: &str, country: &str) -> Entity {
    Entity {
        id: id.into(),
        name: format!("Person {id}"),
        kind: EntityKind::Person,
        country: country.into(),
        industry_code: None,
        formed_at: None,
        employee_count: None,
        is_pep: false,
        has_sanctions_hit: false,
    }
}

fn company(id: &str, country: &str, industry: &str) -> Entity {
    Entity {
        id: id.into(),
        name: format!("Company {id}"),
        kind: EntityKind::Company,
        country: country.into(),
        industry_code: Some(industry.into()),
        formed_at: None,
        employee_count: Some(25),
        is_pep: false,
        has_sanctions_hit: false,
    }
}

fn txn(id: &str, from: &str, to: &str, amount: i64, kind: TransactionKind) -> Transaction {
    Transaction {
        id: id.into(),
        sender_id: from.into(),
        receiver_id: to.into(),
        amount: Decimal::from(amount),
        currency: "EUR".into(),
        timestamp: base(),
        kind,
    }
}

/// Sanctions hit, high-risk jurisdiction, and high-risk industry together
/// land in the high tier and require enhanced due diligence.
#[test]
fn sanctioned_entity_in_high_risk_country_requires_edd() {
    let mut entity = company("e-1", "IR", "6199");
    entity.has_sanctions_hit = true;

    let assessment = EntityRiskScorer::with_defaults()
        .score(&entity, &[], &[], &[])
        .unwrap();

    assert!(assessment.score >= 0.5, "expected >= 0.5, got {}", assessment.score);
    assert!(assessment.tier >= RiskTier::High);
    assert!(assessment.requires_edd);
    assert!(!assessment.recommendations.is_empty());
}

/// A clean domestic person contributes no factors at all.
#[test]
fn clean_entity_scores_low() {
    let assessment = EntityRiskScorer::with_defaults()
        .score(&person("e-2", "DE"), &[], &[], &[])
        .unwrap();

    assert_eq!(assessment.score, 0.0);
    assert_eq!(assessment.tier, RiskTier::Low);
    assert!(assessment.factors.is_empty());
    assert!(!assessment.requires_edd);
    assert!(
        !assessment.recommendations.is_empty(),
        "even low risk carries a monitoring recommendation"
    );
}

/// Tier band lower bounds are inclusive.
#[test]
fn tier_boundaries_are_inclusive() {
    let bands = TierBands::default();
    assert_eq!(RiskTier::from_score(0.0, &bands), RiskTier::Low);
    assert_eq!(RiskTier::from_score(0.24, &bands), RiskTier::Low);
    assert_eq!(RiskTier::from_score(0.25, &bands), RiskTier::Medium);
    assert_eq!(RiskTier::from_score(0.50, &bands), RiskTier::High);
    assert_eq!(RiskTier::from_score(0.75, &bands), RiskTier::VeryHigh);
    assert_eq!(RiskTier::from_score(0.90, &bands), RiskTier::Prohibited);
    assert_eq!(RiskTier::from_score(1.0, &bands), RiskTier::Prohibited);
}

/// Identical inputs always produce the identical assessment.
#[test]
fn scoring_is_deterministic() {
    let mut entity = company("e-3", "PA", "7995");
    entity.is_pep = true;
    let history = vec![
        txn("t1", "e-3", "x", 120_000, TransactionKind::Wire),
        txn("t2", "y", "e-3", 45_000, TransactionKind::Cash),
    ];
    let relationships = vec![Relationship {
        counterparty_id: "e-9".into(),
        kind: RelationshipKind::TransactsWith,
        counterparty_tier: Some(RiskTier::VeryHigh),
    }];

    let scorer = EntityRiskScorer::with_defaults();
    let a = scorer.score(&entity, &history, &relationships, &[]).unwrap();
    let b = scorer.score(&entity, &history, &relationships, &[]).unwrap();
    assert_eq!(a, b);
}

/// Factors come back ordered by weighted contribution, strongest first.
#[test]
fn factors_are_ordered_by_contribution() {
    let mut entity = company("e-4", "IR", "6199");
    entity.is_pep = true;

    let assessment = EntityRiskScorer::with_defaults()
        .score(&entity, &[], &[], &[])
        .unwrap();

    assert!(assessment.factors.len() >= 2);
    let contributions: Vec<f64> = assessment
        .factors
        .iter()
        .map(|f| f.weight * f.score)
        .collect();
    assert!(
        contributions.windows(2).all(|w| w[0] >= w[1]),
        "factors out of order: {contributions:?}"
    );
}

/// A young company with no staff and a catch-all industry code trips every
/// shell indicator.
#[test]
fn shell_indicators_raise_the_ownership_factor() {
    let mut entity = company("e-5", "DE", "9999");
    entity.employee_count = Some(0);
    entity.formed_at = Some(base() - Duration::days(100));
    let history = vec![txn("t1", "e-5", "x", 10_000, TransactionKind::Wire)];

    let assessment = EntityRiskScorer::with_defaults()
        .score(&entity, &history, &[], &[])
        .unwrap();

    let ownership = assessment
        .factors
        .iter()
        .find(|f| f.category == FactorCategory::Ownership)
        .expect("ownership factor should fire");
    assert_eq!(ownership.score, 1.0, "three indicators cap the score");
    assert!(ownership.rationale.contains("no employees"));
}

/// Proximity to a very-high-risk counterparty contributes on its own.
#[test]
fn risky_counterparty_adds_a_relationship_factor() {
    let relationships = vec![Relationship {
        counterparty_id: "e-9".into(),
        kind: RelationshipKind::Owns,
        counterparty_tier: Some(RiskTier::VeryHigh),
    }];

    let assessment = EntityRiskScorer::with_defaults()
        .score(&person("e-6", "DE"), &[], &relationships, &[])
        .unwrap();

    assert!(assessment
        .factors
        .iter()
        .any(|f| f.category == FactorCategory::Relationship));
}

/// A sanctioned sender moving a critical-tier amount in crypto from a
/// high-risk country is high risk by every primary signal.
#[test]
fn large_crypto_transfer_with_sanctioned_sender_is_high_risk() {
    let transfer = txn("t1", "e-1", "e-2", 2_000_000, TransactionKind::Crypto);
    let mut sender = person("e-1", "IR");
    sender.has_sanctions_hit = true;
    let receiver = person("e-2", "DE");

    let assessment = TransactionRiskScorer::with_defaults()
        .score(&transfer, &sender, &receiver, &[])
        .unwrap();

    assert_eq!(assessment.tier, RiskTier::High);
    assert!(assessment.requires_edd);
    assert!(assessment
        .factors
        .iter()
        .any(|f| f.category == FactorCategory::Geographic));
    assert!(assessment
        .factors
        .iter()
        .any(|f| f.category == FactorCategory::Customer));
}

/// Ten times the sender's baseline mean fires the behavioral factor at
/// full strength.
#[test]
fn baseline_deviation_adds_a_behavioral_factor() {
    let transfer = txn("t9", "e-1", "e-2", 100_000, TransactionKind::Wire);
    let history = vec![
        txn("h1", "e-1", "x", 10_000, TransactionKind::Wire),
        txn("h2", "e-1", "y", 10_000, TransactionKind::Wire),
        txn("h3", "e-1", "z", 10_000, TransactionKind::Wire),
    ];

    let assessment = TransactionRiskScorer::with_defaults()
        .score(&transfer, &person("e-1", "DE"), &person("e-2", "DE"), &history)
        .unwrap();

    let behavioral = assessment
        .factors
        .iter()
        .find(|f| f.category == FactorCategory::Behavioral)
        .expect("behavioral factor should fire at 10x baseline");
    assert_eq!(behavioral.score, 1.0);
}

/// Two history entries are too few to establish a baseline.
#[test]
fn thin_history_never_fires_the_behavioral_factor() {
    let transfer = txn("t9", "e-1", "e-2", 100_000, TransactionKind::Wire);
    let history = vec![
        txn("h1", "e-1", "x", 10_000, TransactionKind::Wire),
        txn("h2", "e-1", "y", 10_000, TransactionKind::Wire),
    ];

    let assessment = TransactionRiskScorer::with_defaults()
        .score(&transfer, &person("e-1", "DE"), &person("e-2", "DE"), &history)
        .unwrap();

    assert!(assessment
        .factors
        .iter()
        .all(|f| f.category != FactorCategory::Behavioral));
}

/// Custom amount tiers shift the transaction factor.
#[test]
fn custom_amount_tiers_are_honored() {
    let tiers = AmountTiers {
        medium: Decimal::from(1_000),
        high: Decimal::from(5_000),
        very_high: Decimal::from(20_000),
        critical: Decimal::from(50_000),
    };
    let scorer = TransactionRiskScorer::new(RiskReferenceData::default(), tiers).unwrap();

    let transfer = txn("t1", "e-1", "e-2", 60_000, TransactionKind::Wire);
    let assessment = scorer
        .score(&transfer, &person("e-1", "DE"), &person("e-2", "DE"), &[])
        .unwrap();

    let factor = assessment
        .factors
        .iter()
        .find(|f| f.category == FactorCategory::Transaction)
        .expect("transaction factor always fires");
    assert_eq!(factor.score, 1.0, "60k is critical under the custom tiers");
}
