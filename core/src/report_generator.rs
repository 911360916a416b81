//! Builds suspicious-activity reports from detector output, plus the
//! direct CTR path for large single cash transactions.

use crate::config::ReportConfig;
use crate::error::{AmlError, AmlResult};
use crate::sar::{ReportPriority, ReportStatus, ReportType, SarReport, Subject};
use crate::types::{Amount, Entity, PatternMatch, Severity, Transaction, TransactionKind};
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct ReportGenerator {
    config: ReportConfig,
}

impl ReportGenerator {
    pub fn new(config: ReportConfig) -> AmlResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Draft a report from a set of pattern matches. Subjects and
    /// transaction references are derived from the matches; the aggregate
    /// amount is the sum of the distinct referenced transactions found in
    /// the supplied batch.
    pub fn create_from_patterns(
        &self,
        matches: &[PatternMatch],
        entities: &[Entity],
        transactions: &[Transaction],
        created_by: &str,
    ) -> AmlResult<SarReport> {
        if matches.is_empty() {
            return Err(AmlError::invalid_input(
                "matches",
                "cannot draft a report from zero pattern matches",
            ));
        }
        if created_by.is_empty() {
            return Err(AmlError::invalid_input("created_by", "creator is empty"));
        }

        let entity_ids: BTreeSet<&String> = matches.iter().flat_map(|m| &m.entities).collect();
        let subjects: Vec<Subject> = entity_ids
            .iter()
            .map(|id| {
                let name = entities
                    .iter()
                    .find(|e| e.id == **id)
                    .map(|e| e.name.clone())
                    .unwrap_or_else(|| (*id).clone());
                Subject {
                    entity_id: (*id).clone(),
                    name,
                    role: "subject".into(),
                }
            })
            .collect();

        let txn_ids: BTreeSet<&String> = matches.iter().flat_map(|m| &m.transactions).collect();
        let total: Amount = txn_ids
            .iter()
            .filter_map(|id| transactions.iter().find(|t| t.id == **id))
            .map(|t| t.amount)
            .sum();

        let activity_start = matches
            .iter()
            .map(|m| m.window_start)
            .min()
            .unwrap_or_else(Utc::now);
        let activity_end = matches
            .iter()
            .map(|m| m.window_end)
            .max()
            .unwrap_or_else(Utc::now);

        let narrative = matches
            .iter()
            .map(|m| format!("[{}] {}", m.pattern, m.description))
            .collect::<Vec<_>>()
            .join("\n");
        let grounds: Vec<String> = matches
            .iter()
            .map(|m| m.pattern)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|p| format!("detected {p} activity"))
            .collect();

        let priority = priority_for(matches, total);
        let now = Utc::now();
        let report = SarReport {
            id: Uuid::new_v4(),
            report_type: ReportType::Sar,
            status: ReportStatus::Draft,
            priority,
            summary: format!(
                "{} suspicious pattern(s) involving {} subject(s), total {}",
                matches.len(),
                subjects.len(),
                total
            ),
            subjects,
            transaction_ids: txn_ids.into_iter().cloned().collect(),
            narrative,
            suspicion_grounds: grounds,
            total_amount: total,
            currency: matches[0].currency.clone(),
            activity_start,
            activity_end,
            external_reference: None,
            created_by: created_by.to_string(),
            reviewed_by: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };

        log::info!(
            "drafted report {} ({} matches, priority {:?})",
            report.id,
            matches.len(),
            report.priority
        );
        Ok(report)
    }

    /// Direct currency-transaction-report path for one large cash
    /// transaction, bypassing pattern detection.
    pub fn create_ctr(
        &self,
        transaction: &Transaction,
        entity: &Entity,
        created_by: &str,
    ) -> AmlResult<SarReport> {
        transaction.validate()?;
        if created_by.is_empty() {
            return Err(AmlError::invalid_input("created_by", "creator is empty"));
        }
        if transaction.kind != TransactionKind::Cash {
            return Err(AmlError::invalid_input(
                "kind",
                format!("CTR applies to cash transactions, got {:?}", transaction.kind),
            ));
        }
        if transaction.amount < self.config.ctr_threshold {
            return Err(AmlError::invalid_input(
                "amount",
                format!(
                    "amount {} is below the CTR threshold {}",
                    transaction.amount, self.config.ctr_threshold
                ),
            ));
        }

        let priority = if transaction.amount >= Decimal::from(1_000_000) {
            ReportPriority::High
        } else {
            ReportPriority::Medium
        };
        let now = Utc::now();
        let report = SarReport {
            id: Uuid::new_v4(),
            report_type: ReportType::Ctr,
            status: ReportStatus::Draft,
            priority,
            subjects: vec![Subject {
                entity_id: entity.id.clone(),
                name: entity.name.clone(),
                role: "transacting party".into(),
            }],
            transaction_ids: vec![transaction.id.clone()],
            summary: format!(
                "Cash transaction of {} at or above the {} reporting threshold",
                transaction.amount, self.config.ctr_threshold
            ),
            narrative: format!(
                "{} conducted a cash transaction of {} {} on {}, meeting the \
                 currency transaction reporting threshold of {}.",
                entity.name,
                transaction.amount,
                transaction.currency,
                transaction.timestamp.format("%Y-%m-%d"),
                self.config.ctr_threshold
            ),
            suspicion_grounds: vec!["large cash transaction".into()],
            total_amount: transaction.amount,
            currency: transaction.currency.clone(),
            activity_start: transaction.timestamp,
            activity_end: transaction.timestamp,
            external_reference: None,
            created_by: created_by.to_string(),
            reviewed_by: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };

        log::info!("drafted CTR {} for transaction {}", report.id, transaction.id);
        Ok(report)
    }
}

/// Worst-case severity and aggregate amount drive the priority.
fn priority_for(matches: &[PatternMatch], total: Amount) -> ReportPriority {
    let worst = matches.iter().map(|m| m.severity).max();
    if worst == Some(Severity::Critical) || total >= Decimal::from(5_000_000) {
        ReportPriority::Urgent
    } else if worst == Some(Severity::High) || total >= Decimal::from(1_000_000) {
        ReportPriority::High
    } else if worst == Some(Severity::Medium) || total >= Decimal::from(500_000) {
        ReportPriority::Medium
    } else {
        ReportPriority::Low
    }
}
