//! Shared primitive types used across the entire detection core.

use crate::error::{AmlError, AmlResult};
use crate::risk::RiskTier;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A stable, unique identifier for any entity (person or company).
pub type EntityId = String;

/// A stable, unique identifier for a ledger transaction.
pub type TransactionId = String;

/// Monetary amount. Fixed-point decimal; never a float.
pub type Amount = Decimal;

/// Ordered severity scale shared by all pattern matches.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Transaction instrument type as supplied by the ledger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Cash,
    Wire,
    InternationalWire,
    Ach,
    Check,
    MoneyOrder,
    Crypto,
    Internal,
}

impl TransactionKind {
    /// Instrument types that carry elevated inherent risk.
    pub fn is_high_risk(self) -> bool {
        matches!(
            self,
            TransactionKind::Cash
                | TransactionKind::Crypto
                | TransactionKind::InternationalWire
                | TransactionKind::MoneyOrder
        )
    }
}

/// A single ledger transaction. Immutable once created; supplied by the
/// external ledger collaborator and never cached by this core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub sender_id: EntityId,
    pub receiver_id: EntityId,
    pub amount: Amount,
    pub currency: String,
    pub timestamp: DateTime<Utc>,
    pub kind: TransactionKind,
}

impl Transaction {
    /// Reject malformed transactions before any detection runs.
    pub fn validate(&self) -> AmlResult<()> {
        if self.id.is_empty() {
            return Err(AmlError::invalid_input("id", "transaction id is empty"));
        }
        if self.sender_id.is_empty() {
            return Err(AmlError::invalid_input("sender_id", "sender id is empty"));
        }
        if self.receiver_id.is_empty() {
            return Err(AmlError::invalid_input(
                "receiver_id",
                "receiver id is empty",
            ));
        }
        if self.amount.is_sign_negative() {
            return Err(AmlError::invalid_input(
                "amount",
                format!("amount {} is negative", self.amount),
            ));
        }
        if self.currency.is_empty() {
            return Err(AmlError::invalid_input("currency", "currency is empty"));
        }
        Ok(())
    }
}

/// Sort transactions chronologically. Ties in timestamp break on
/// transaction id, so every detector sees the same stable order.
pub(crate) fn chronological<'a>(transactions: &'a [Transaction]) -> Vec<&'a Transaction> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
    sorted
}

/// The closed set of typologies this core detects.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Structuring,
    Layering,
    RapidMovement,
    RoundTrip,
    Smurfing,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PatternKind::Structuring => "structuring",
            PatternKind::Layering => "layering",
            PatternKind::RapidMovement => "rapid_movement",
            PatternKind::RoundTrip => "round_trip",
            PatternKind::Smurfing => "smurfing",
        };
        f.write_str(s)
    }
}

/// One detected instance of a suspicious typology.
///
/// Invariants: `window_start <= window_end`, `confidence` in [0, 1], and
/// `total_amount` is the sum of the involved transactions' amounts in the
/// detector's own terms (each detector documents its aggregate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub pattern: PatternKind,
    pub severity: Severity,
    pub confidence: f64,
    pub description: String,
    pub entities: BTreeSet<EntityId>,
    pub transactions: BTreeSet<TransactionId>,
    pub total_amount: Amount,
    pub currency: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Free-form structured detail, detector-specific.
    pub details: serde_json::Value,
}

/// Person or company, as supplied by the graph/persistence collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Person,
    Company,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
    pub industry_code: Option<String>,
    pub formed_at: Option<DateTime<Utc>>,
    pub employee_count: Option<u32>,
    pub is_pep: bool,
    pub has_sanctions_hit: bool,
}

/// A direct relationship between the assessed entity and a counterparty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Owns,
    OwnedBy,
    Director,
    TransactsWith,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub counterparty_id: EntityId,
    pub kind: RelationshipKind,
    /// Risk tier of the counterparty from a previous assessment, if the
    /// caller has one on file.
    pub counterparty_tier: Option<RiskTier>,
}
