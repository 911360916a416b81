//! Detector contract and the closed detector registry.
//!
//! RULE: every typology analyzer implements PatternDetector, and the full
//! set of detectors is the fixed, caller-visible list below. There is no
//! dynamic discovery; adding a typology means adding a variant.

use crate::config::{
    LayeringConfig, RapidMovementConfig, RoundTripConfig, SmurfingConfig, StructuringConfig,
};
use crate::error::AmlResult;
use crate::layering::Layering;
use crate::rapid_movement::RapidMovement;
use crate::round_trip::RoundTrip;
use crate::smurfing::Smurfing;
use crate::structuring::Structuring;
use crate::types::{PatternMatch, Transaction};

/// The contract every typology analyzer fulfills.
///
/// `detect` is pure with respect to the detector's configuration: no input
/// mutation, no hidden state, no randomness. A transaction may appear in
/// more than one match; cross-detector overlap is resolved by the caller,
/// not here.
pub trait PatternDetector: Send + Sync {
    /// Unique stable name for this detector.
    fn name(&self) -> &'static str;

    fn detect(&self, transactions: &[Transaction]) -> AmlResult<Vec<PatternMatch>>;
}

/// The closed set of detectors, one variant per typology.
#[derive(Debug, Clone)]
pub enum Detector {
    Structuring(Structuring),
    Layering(Layering),
    RapidMovement(RapidMovement),
    RoundTrip(RoundTrip),
    Smurfing(Smurfing),
}

impl Detector {
    /// All five detectors with their default configuration.
    pub fn default_set() -> Vec<Detector> {
        vec![
            Detector::Structuring(Structuring::default()),
            Detector::Layering(Layering::default()),
            Detector::RapidMovement(RapidMovement::default()),
            Detector::RoundTrip(RoundTrip::default()),
            Detector::Smurfing(Smurfing::default()),
        ]
    }

    /// All five detectors with caller-supplied configuration, validated at
    /// construction.
    pub fn configured_set(
        structuring: StructuringConfig,
        layering: LayeringConfig,
        rapid_movement: RapidMovementConfig,
        round_trip: RoundTripConfig,
        smurfing: SmurfingConfig,
    ) -> AmlResult<Vec<Detector>> {
        Ok(vec![
            Detector::Structuring(Structuring::new(structuring)?),
            Detector::Layering(Layering::new(layering)?),
            Detector::RapidMovement(RapidMovement::new(rapid_movement)?),
            Detector::RoundTrip(RoundTrip::new(round_trip)?),
            Detector::Smurfing(Smurfing::new(smurfing)?),
        ])
    }
}

impl PatternDetector for Detector {
    fn name(&self) -> &'static str {
        match self {
            Detector::Structuring(d) => d.name(),
            Detector::Layering(d) => d.name(),
            Detector::RapidMovement(d) => d.name(),
            Detector::RoundTrip(d) => d.name(),
            Detector::Smurfing(d) => d.name(),
        }
    }

    fn detect(&self, transactions: &[Transaction]) -> AmlResult<Vec<PatternMatch>> {
        match self {
            Detector::Structuring(d) => d.detect(transactions),
            Detector::Layering(d) => d.detect(transactions),
            Detector::RapidMovement(d) => d.detect(transactions),
            Detector::RoundTrip(d) => d.detect(transactions),
            Detector::Smurfing(d) => d.detect(transactions),
        }
    }
}
