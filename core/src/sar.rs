//! Suspicious-activity report object and its workflow state machine.
//!
//! RULE: status only ever changes through the transition table below.
//! Anything not in the table is a workflow violation that leaves the
//! report untouched. Terminal states are retained for audit; a report is
//! never deleted.

use crate::error::{AmlError, AmlResult};
use crate::types::{Amount, EntityId, TransactionId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Export schema version stamped on every serialized report.
pub const EXPORT_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReportType {
    Str,
    Ctr,
    Sar,
    Tfar,
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportType::Str => "STR",
            ReportType::Ctr => "CTR",
            ReportType::Sar => "SAR",
            ReportType::Tfar => "TFAR",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Draft,
    PendingReview,
    Approved,
    Submitted,
    Acknowledged,
    Rejected,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportStatus::Draft => "draft",
            ReportStatus::PendingReview => "pending_review",
            ReportStatus::Approved => "approved",
            ReportStatus::Submitted => "submitted",
            ReportStatus::Acknowledged => "acknowledged",
            ReportStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// The exhaustive set of legal transitions.
const TRANSITIONS: &[(ReportStatus, ReportStatus)] = &[
    (ReportStatus::Draft, ReportStatus::PendingReview),
    (ReportStatus::PendingReview, ReportStatus::Approved),
    (ReportStatus::PendingReview, ReportStatus::Rejected),
    (ReportStatus::Approved, ReportStatus::Submitted),
    (ReportStatus::Submitted, ReportStatus::Acknowledged),
];

fn transition_allowed(from: ReportStatus, to: ReportStatus) -> bool {
    TRANSITIONS.contains(&(from, to))
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ReportPriority {
    Urgent,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub entity_id: EntityId,
    pub name: String,
    pub role: String,
}

/// A completeness problem that blocks submission for review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarReport {
    pub id: Uuid,
    pub report_type: ReportType,
    pub status: ReportStatus,
    pub priority: ReportPriority,
    pub subjects: Vec<Subject>,
    pub transaction_ids: Vec<TransactionId>,
    pub summary: String,
    pub narrative: String,
    pub suspicion_grounds: Vec<String>,
    pub total_amount: Amount,
    pub currency: String,
    pub activity_start: DateTime<Utc>,
    pub activity_end: DateTime<Utc>,
    /// Assigned exactly once, on submission.
    pub external_reference: Option<String>,
    pub created_by: String,
    pub reviewed_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Versioned export envelope for the regulator's submission channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarExport {
    pub schema_version: String,
    pub report: SarReport,
}

impl SarReport {
    /// Completeness check. Empty output means the report can move to
    /// review.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if self.subjects.is_empty() {
            issues.push(ValidationIssue {
                field: "subjects",
                reason: "report names no subjects".into(),
            });
        }
        if self.transaction_ids.is_empty() {
            issues.push(ValidationIssue {
                field: "transaction_ids",
                reason: "report references no transactions".into(),
            });
        }
        if self.narrative.trim().is_empty() {
            issues.push(ValidationIssue {
                field: "narrative",
                reason: "narrative is empty".into(),
            });
        }
        if self.total_amount <= Decimal::ZERO {
            issues.push(ValidationIssue {
                field: "total_amount",
                reason: format!("total amount {} is not positive", self.total_amount),
            });
        }
        if self.activity_start > self.activity_end {
            issues.push(ValidationIssue {
                field: "activity_start",
                reason: "activity window start is after its end".into(),
            });
        }
        issues
    }

    fn transition(&mut self, to: ReportStatus) -> AmlResult<()> {
        if !transition_allowed(self.status, to) {
            return Err(AmlError::WorkflowViolation {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        log::info!("report {}: {} -> {}", self.id, self.status, to);
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// draft -> pending_review. Requires a clean validation pass.
    pub fn submit_for_review(&mut self) -> AmlResult<()> {
        if !transition_allowed(self.status, ReportStatus::PendingReview) {
            return Err(AmlError::WorkflowViolation {
                from: self.status.to_string(),
                to: ReportStatus::PendingReview.to_string(),
            });
        }
        let issues = self.validate();
        if let Some(first) = issues.first() {
            for issue in &issues {
                log::warn!("report {} blocked: {}: {}", self.id, issue.field, issue.reason);
            }
            return Err(AmlError::invalid_input(first.field, first.reason.clone()));
        }
        self.transition(ReportStatus::PendingReview)
    }

    /// pending_review -> approved. Self-approval is rejected.
    pub fn approve(&mut self, reviewer: &str) -> AmlResult<()> {
        if reviewer.is_empty() {
            return Err(AmlError::invalid_input("reviewer", "reviewer is empty"));
        }
        if reviewer == self.created_by {
            return Err(AmlError::invalid_input(
                "reviewer",
                "reviewer must be distinct from the report creator",
            ));
        }
        self.transition(ReportStatus::Approved)?;
        self.reviewed_by = Some(reviewer.to_string());
        Ok(())
    }

    /// pending_review -> rejected. Terminal for this cycle.
    pub fn reject(&mut self, reviewer: &str, reason: &str) -> AmlResult<()> {
        if reviewer.is_empty() {
            return Err(AmlError::invalid_input("reviewer", "reviewer is empty"));
        }
        self.transition(ReportStatus::Rejected)?;
        self.reviewed_by = Some(reviewer.to_string());
        self.rejection_reason = Some(reason.to_string());
        Ok(())
    }

    /// approved -> submitted. Mints the external reference exactly once
    /// and freezes content.
    pub fn submit(&mut self) -> AmlResult<()> {
        self.transition(ReportStatus::Submitted)?;
        if self.external_reference.is_none() {
            let reference = format!(
                "{}-{}-{}",
                self.report_type,
                self.updated_at.format("%Y%m%d"),
                &self.id.simple().to_string()[..8]
            );
            log::info!("report {} submitted as {}", self.id, reference);
            self.external_reference = Some(reference);
        }
        Ok(())
    }

    /// submitted -> acknowledged. Records the regulator's acknowledgement.
    pub fn acknowledge(&mut self) -> AmlResult<()> {
        self.transition(ReportStatus::Acknowledged)
    }

    /// Clone a rejected report into a fresh draft with a new id. The
    /// rejected original is left untouched.
    pub fn clone_as_draft(&self, created_by: &str) -> AmlResult<SarReport> {
        if self.status != ReportStatus::Rejected {
            return Err(AmlError::WorkflowViolation {
                from: self.status.to_string(),
                to: ReportStatus::Draft.to_string(),
            });
        }
        let now = Utc::now();
        let mut draft = self.clone();
        draft.id = Uuid::new_v4();
        draft.status = ReportStatus::Draft;
        draft.external_reference = None;
        draft.reviewed_by = None;
        draft.rejection_reason = None;
        draft.created_by = created_by.to_string();
        draft.created_at = now;
        draft.updated_at = now;
        Ok(draft)
    }

    fn editable(&self) -> AmlResult<()> {
        match self.status {
            ReportStatus::Draft | ReportStatus::PendingReview => Ok(()),
            other => Err(AmlError::WorkflowViolation {
                from: other.to_string(),
                to: other.to_string(),
            }),
        }
    }

    pub fn set_narrative(&mut self, narrative: &str) -> AmlResult<()> {
        self.editable()?;
        self.narrative = narrative.to_string();
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_summary(&mut self, summary: &str) -> AmlResult<()> {
        self.editable()?;
        self.summary = summary.to_string();
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn add_suspicion_ground(&mut self, ground: &str) -> AmlResult<()> {
        self.editable()?;
        self.suspicion_grounds.push(ground.to_string());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Serialize to the fixed, versioned export document.
    pub fn to_export_json(&self) -> AmlResult<String> {
        let export = SarExport {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            report: self.clone(),
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Parse a versioned export document back into an equal report.
    pub fn from_export_json(json: &str) -> AmlResult<SarReport> {
        let export: SarExport = serde_json::from_str(json)?;
        if export.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(AmlError::invalid_input(
                "schema_version",
                format!(
                    "unsupported schema version '{}', expected '{EXPORT_SCHEMA_VERSION}'",
                    export.schema_version
                ),
            ));
        }
        Ok(export.report)
    }
}
