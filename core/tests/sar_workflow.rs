//! Report workflow tests: the transition table, the review gates, the
//! once-only external reference, and the versioned export format.

use chrono::{Duration, TimeZone, Utc};
use fintel_core::error::AmlError;
use fintel_core::sar::{ReportPriority, ReportStatus, ReportType, SarReport, Subject};
use rust_decimal_macros::dec;
use uuid::Uuid;

fn draft() -> SarReport {
    let now = Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap();
    SarReport {
        id: Uuid::new_v4(),
        report_type: ReportType::Sar,
        status: ReportStatus::Draft,
        priority: ReportPriority::Medium,
        subjects: vec![Subject {
            entity_id: "e-1".into(),
            name: "Acme Trading Ltd".into(),
            role: "subject".into(),
        }],
        transaction_ids: vec!["t-1".into(), "t-2".into(), "t-3".into()],
        summary: "Structured cash deposits under the reporting threshold".into(),
        narrative: "Three deposits of 145,000 each over seven days, all just \
                    under the 150,000 reporting threshold."
            .into(),
        suspicion_grounds: vec!["structuring".into()],
        total_amount: dec!(435000),
        currency: "EUR".into(),
        activity_start: now - Duration::days(7),
        activity_end: now,
        external_reference: None,
        created_by: "analyst.kim".into(),
        reviewed_by: None,
        rejection_reason: None,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn happy_path_reaches_acknowledged() {
    let mut report = draft();

    report.submit_for_review().unwrap();
    assert_eq!(report.status, ReportStatus::PendingReview);

    report.approve("reviewer.lee").unwrap();
    assert_eq!(report.status, ReportStatus::Approved);
    assert_eq!(report.reviewed_by.as_deref(), Some("reviewer.lee"));

    report.submit().unwrap();
    assert_eq!(report.status, ReportStatus::Submitted);
    let reference = report.external_reference.clone().expect("reference minted");
    assert!(reference.starts_with("SAR-"), "got {reference}");

    report.acknowledge().unwrap();
    assert_eq!(report.status, ReportStatus::Acknowledged);
    assert_eq!(report.external_reference.as_deref(), Some(reference.as_str()));
}

/// Skipping review is a workflow violation and leaves the report intact.
#[test]
fn draft_cannot_be_submitted_directly() {
    let mut report = draft();
    let err = report.submit().unwrap_err();
    assert!(matches!(err, AmlError::WorkflowViolation { .. }));
    assert_eq!(report.status, ReportStatus::Draft);
    assert!(report.external_reference.is_none(), "no reference before submission");
}

#[test]
fn acknowledged_is_terminal() {
    let mut report = draft();
    report.submit_for_review().unwrap();
    report.approve("reviewer.lee").unwrap();
    report.submit().unwrap();
    let reference = report.external_reference.clone();
    report.acknowledge().unwrap();

    assert!(report.submit().is_err());
    assert!(report.submit_for_review().is_err());
    assert_eq!(report.external_reference, reference, "reference never changes");
}

/// The creator may not review their own report.
#[test]
fn self_approval_is_rejected() {
    let mut report = draft();
    report.submit_for_review().unwrap();

    let err = report.approve("analyst.kim").unwrap_err();
    assert!(matches!(err, AmlError::InvalidInput { .. }));
    assert_eq!(report.status, ReportStatus::PendingReview);
    assert!(report.reviewed_by.is_none());
}

/// An incomplete report never leaves draft.
#[test]
fn incomplete_report_is_blocked_from_review() {
    let mut report = draft();
    report.narrative = String::new();

    let err = report.submit_for_review().unwrap_err();
    assert!(matches!(err, AmlError::InvalidInput { .. }));
    assert_eq!(report.status, ReportStatus::Draft);
}

#[test]
fn validation_lists_every_problem() {
    let mut report = draft();
    report.subjects.clear();
    report.narrative = String::new();
    report.total_amount = dec!(0);

    let issues = report.validate();
    assert_eq!(issues.len(), 3, "got {issues:?}");
}

/// A rejected report stays on file; rework happens in a fresh draft.
#[test]
fn rejected_report_is_recycled_as_a_new_draft() {
    let mut report = draft();
    report.submit_for_review().unwrap();
    report
        .reject("reviewer.lee", "narrative lacks corroborating detail")
        .unwrap();
    assert_eq!(report.status, ReportStatus::Rejected);
    assert!(report.rejection_reason.is_some());

    let redraft = report.clone_as_draft("analyst.kim").unwrap();
    assert_ne!(redraft.id, report.id);
    assert_eq!(redraft.status, ReportStatus::Draft);
    assert!(redraft.reviewed_by.is_none());
    assert!(redraft.rejection_reason.is_none());
    assert!(redraft.external_reference.is_none());
    assert_eq!(redraft.transaction_ids, report.transaction_ids);

    assert_eq!(report.status, ReportStatus::Rejected, "original is untouched");
}

#[test]
fn only_rejected_reports_can_be_recycled() {
    let report = draft();
    assert!(report.clone_as_draft("analyst.kim").is_err());
}

/// Content mutators work in draft and review, and nowhere later.
#[test]
fn content_freezes_after_approval() {
    let mut report = draft();
    report.set_narrative("Expanded narrative with dates and amounts.").unwrap();
    report.add_suspicion_ground("rapid pass-through").unwrap();

    report.submit_for_review().unwrap();
    report.set_summary("Tightened summary.").unwrap();

    report.approve("reviewer.lee").unwrap();
    assert!(report.set_narrative("too late").is_err());
    assert!(report.set_summary("too late").is_err());
    assert!(report.add_suspicion_ground("too late").is_err());
}

/// Serialize then parse yields a field-for-field equal report.
#[test]
fn export_round_trips_exactly() {
    let report = draft();
    let json = report.to_export_json().unwrap();
    assert!(json.contains("\"schema_version\": \"1.0\""));

    let parsed = SarReport::from_export_json(&json).unwrap();
    assert_eq!(parsed, report);
}

#[test]
fn unknown_export_schema_version_is_rejected() {
    let report = draft();
    let json = report
        .to_export_json()
        .unwrap()
        .replace("\"schema_version\": \"1.0\"", "\"schema_version\": \"9.9\"");

    let err = SarReport::from_export_json(&json).unwrap_err();
    assert!(matches!(err, AmlError::InvalidInput { .. }));
}
