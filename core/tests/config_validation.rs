//! Configuration validation tests: every threshold struct rejects
//! inconsistent values at construction, never at call time.

use fintel_core::config::{
    AmountTiers, LayeringConfig, RapidMovementConfig, ReportConfig, RoundTripConfig,
    ScreenerConfig, SmurfingConfig, StructuringConfig,
};
use fintel_core::detector::Detector;
use fintel_core::error::AmlError;
use fintel_core::risk::TierBands;
use fintel_core::structuring::Structuring;
use rust_decimal::Decimal;

#[test]
fn defaults_all_validate() {
    StructuringConfig::default().validate().unwrap();
    LayeringConfig::default().validate().unwrap();
    RapidMovementConfig::default().validate().unwrap();
    RoundTripConfig::default().validate().unwrap();
    SmurfingConfig::default().validate().unwrap();
    ScreenerConfig::default().validate().unwrap();
    AmountTiers::default().validate().unwrap();
    ReportConfig::default().validate().unwrap();
    TierBands::default().validate().unwrap();
}

#[test]
fn structuring_rejects_out_of_range_band() {
    let config = StructuringConfig {
        band_fraction: 1.5,
        ..StructuringConfig::default()
    };
    assert!(matches!(config.validate(), Err(AmlError::Config { .. })));

    let config = StructuringConfig {
        min_count: 1,
        ..StructuringConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn layering_rejects_inverted_hop_caps() {
    let config = LayeringConfig {
        min_hops: 5,
        max_hops: 3,
        ..LayeringConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn rapid_movement_rejects_zero_gap() {
    let config = RapidMovementConfig {
        max_gap_hours: 0,
        ..RapidMovementConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn round_trip_rejects_full_loss() {
    let config = RoundTripConfig {
        max_loss_fraction: 1.0,
        ..RoundTripConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn smurfing_rejects_a_single_sender() {
    let config = SmurfingConfig {
        min_senders: 1,
        ..SmurfingConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn screener_rejects_a_toothless_penalty() {
    let config = ScreenerConfig {
        dob_mismatch_penalty: 1.0,
        ..ScreenerConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn amount_tiers_must_strictly_ascend() {
    let tiers = AmountTiers {
        medium: Decimal::from(100_000),
        high: Decimal::from(100_000),
        very_high: Decimal::from(500_000),
        critical: Decimal::from(1_000_000),
    };
    assert!(tiers.validate().is_err());
}

#[test]
fn tier_bands_must_strictly_ascend() {
    let bands = TierBands {
        medium: 0.5,
        high: 0.4,
        very_high: 0.75,
        prohibited: 0.9,
    };
    assert!(bands.validate().is_err());
}

/// Detector constructors refuse invalid configuration outright.
#[test]
fn detector_construction_propagates_config_errors() {
    let bad = StructuringConfig {
        reporting_threshold: Decimal::from(-5),
        ..StructuringConfig::default()
    };
    assert!(Structuring::new(bad.clone()).is_err());

    let err = Detector::configured_set(
        bad,
        LayeringConfig::default(),
        RapidMovementConfig::default(),
        RoundTripConfig::default(),
        SmurfingConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, AmlError::Config { .. }));
}
