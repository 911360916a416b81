//! Detection orchestrator: runs the configured detector set over one
//! transaction batch and reports partial results explicitly.

use crate::detector::{Detector, PatternDetector};
use crate::error::{AmlError, AmlResult};
use crate::types::{PatternKind, PatternMatch, Severity, Transaction};
use std::collections::BTreeMap;

/// One detector's failure, reported alongside the other detectors'
/// results. A failing detector never aborts the batch.
#[derive(Debug)]
pub struct DetectorFailure {
    pub detector: &'static str,
    pub error: AmlError,
}

#[derive(Debug, Default)]
pub struct DetectionOutcome {
    pub matches: Vec<PatternMatch>,
    pub failures: Vec<DetectorFailure>,
}

/// Match counts by typology and by severity, for logging and triage.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DetectionSummary {
    pub total_matches: usize,
    pub failed_detectors: usize,
    pub by_pattern: BTreeMap<PatternKind, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
}

impl DetectionOutcome {
    pub fn summary(&self) -> DetectionSummary {
        let mut by_pattern: BTreeMap<PatternKind, usize> = BTreeMap::new();
        let mut by_severity: BTreeMap<Severity, usize> = BTreeMap::new();
        for m in &self.matches {
            *by_pattern.entry(m.pattern).or_default() += 1;
            *by_severity.entry(m.severity).or_default() += 1;
        }
        DetectionSummary {
            total_matches: self.matches.len(),
            failed_detectors: self.failures.len(),
            by_pattern,
            by_severity,
        }
    }
}

pub struct DetectionEngine {
    detectors: Vec<Detector>,
}

impl DetectionEngine {
    pub fn new(detectors: Vec<Detector>) -> Self {
        Self { detectors }
    }

    /// All five detectors with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(Detector::default_set())
    }

    pub fn detectors(&self) -> &[Detector] {
        &self.detectors
    }

    /// Run every configured detector over the batch. Malformed input is
    /// rejected up front; a failure inside one detector is isolated and
    /// reported next to the other detectors' matches.
    pub fn detect_all(&self, transactions: &[Transaction]) -> AmlResult<DetectionOutcome> {
        for txn in transactions {
            txn.validate()?;
        }

        let mut outcome = DetectionOutcome::default();
        for detector in &self.detectors {
            match detector.detect(transactions) {
                Ok(matches) => outcome.matches.extend(matches),
                Err(error) => {
                    log::error!("detector {} failed: {error}", detector.name());
                    outcome.failures.push(DetectorFailure {
                        detector: detector.name(),
                        error,
                    });
                }
            }
        }

        let summary = outcome.summary();
        log::info!(
            "detection run: {} matches, {} detector failures over {} transactions",
            summary.total_matches,
            summary.failed_detectors,
            transactions.len()
        );
        Ok(outcome)
    }

    /// Entity-scoped variant: restrict the batch to transactions touching
    /// the given entity before running the detectors.
    pub fn detect_for_entity(
        &self,
        entity_id: &str,
        transactions: &[Transaction],
    ) -> AmlResult<DetectionOutcome> {
        if entity_id.is_empty() {
            return Err(AmlError::invalid_input("entity_id", "entity id is empty"));
        }
        let scoped: Vec<Transaction> = transactions
            .iter()
            .filter(|t| t.sender_id == entity_id || t.receiver_id == entity_id)
            .cloned()
            .collect();
        self.detect_all(&scoped)
    }
}
