//! Detector, scorer, and screener configuration.
//!
//! RULE: every threshold lives in one explicit, fully-enumerated config
//! struct with documented defaults. Inconsistent configuration is rejected
//! at construction via `validate()`, never at call time.

use crate::error::{AmlError, AmlResult};
use crate::types::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuringConfig {
    /// Regulatory reporting threshold in currency-local units.
    pub reporting_threshold: Amount,
    /// Lower bound of the suspicious band as a fraction of the threshold.
    /// The band is half-open: `[threshold * band_fraction, threshold)`. An
    /// amount at or above the threshold is excluded, since it trips the
    /// reporting requirement on its own instead of being structured around
    /// it.
    pub band_fraction: f64,
    /// Rolling lookback window in days.
    pub lookback_days: i64,
    /// Minimum transaction count inside one window.
    pub min_count: usize,
}

impl Default for StructuringConfig {
    fn default() -> Self {
        Self {
            reporting_threshold: Decimal::from(150_000),
            band_fraction: 0.95,
            lookback_days: 7,
            min_count: 3,
        }
    }
}

impl StructuringConfig {
    pub fn validate(&self) -> AmlResult<()> {
        if self.reporting_threshold <= Decimal::ZERO {
            return Err(AmlError::config("reporting_threshold must be positive"));
        }
        if !(0.0 < self.band_fraction && self.band_fraction < 1.0) {
            return Err(AmlError::config("band_fraction must be in (0, 1)"));
        }
        if self.lookback_days <= 0 {
            return Err(AmlError::config("lookback_days must be positive"));
        }
        if self.min_count < 2 {
            return Err(AmlError::config("min_count must be at least 2"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayeringConfig {
    /// Minimum number of hops in a chain.
    pub min_hops: usize,
    /// Maximum duration of a full chain, in hours.
    pub max_chain_hours: i64,
    /// Fee tolerance between consecutive hop amounts. A hop may shrink by
    /// at most this fraction of the previous hop; it never grows.
    pub hop_tolerance: f64,
    /// Hard cap on chain depth to bound the traversal.
    pub max_hops: usize,
}

impl Default for LayeringConfig {
    fn default() -> Self {
        Self {
            min_hops: 3,
            max_chain_hours: 72,
            hop_tolerance: 0.10,
            max_hops: 10,
        }
    }
}

impl LayeringConfig {
    pub fn validate(&self) -> AmlResult<()> {
        if self.min_hops < 2 {
            return Err(AmlError::config("min_hops must be at least 2"));
        }
        if self.max_chain_hours <= 0 {
            return Err(AmlError::config("max_chain_hours must be positive"));
        }
        if !(0.0 < self.hop_tolerance && self.hop_tolerance < 1.0) {
            return Err(AmlError::config("hop_tolerance must be in (0, 1)"));
        }
        if self.max_hops < self.min_hops {
            return Err(AmlError::config("max_hops must be >= min_hops"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RapidMovementConfig {
    /// Minimum fraction of the deposit that must leave again.
    pub min_outflow_fraction: f64,
    /// Maximum gap between deposit and withdrawal, in hours.
    pub max_gap_hours: i64,
    /// Minimum deposit amount to consider.
    pub min_amount: Amount,
}

impl Default for RapidMovementConfig {
    fn default() -> Self {
        Self {
            min_outflow_fraction: 0.80,
            max_gap_hours: 24,
            min_amount: Decimal::from(100_000),
        }
    }
}

impl RapidMovementConfig {
    pub fn validate(&self) -> AmlResult<()> {
        if !(0.0 < self.min_outflow_fraction && self.min_outflow_fraction <= 1.0) {
            return Err(AmlError::config("min_outflow_fraction must be in (0, 1]"));
        }
        if self.max_gap_hours <= 0 {
            return Err(AmlError::config("max_gap_hours must be positive"));
        }
        if self.min_amount <= Decimal::ZERO {
            return Err(AmlError::config("min_amount must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTripConfig {
    /// Maximum duration of the full loop, in days.
    pub max_loop_days: i64,
    /// Maximum cumulative loss (fees) across the loop as a fraction of the
    /// originating amount.
    pub max_loss_fraction: f64,
    /// Minimum originating amount.
    pub min_amount: Amount,
    /// Hard cap on loop length to bound the traversal.
    pub max_hops: usize,
}

impl Default for RoundTripConfig {
    fn default() -> Self {
        Self {
            max_loop_days: 30,
            max_loss_fraction: 0.15,
            min_amount: Decimal::from(50_000),
            max_hops: 8,
        }
    }
}

impl RoundTripConfig {
    pub fn validate(&self) -> AmlResult<()> {
        if self.max_loop_days <= 0 {
            return Err(AmlError::config("max_loop_days must be positive"));
        }
        if !(0.0 < self.max_loss_fraction && self.max_loss_fraction < 1.0) {
            return Err(AmlError::config("max_loss_fraction must be in (0, 1)"));
        }
        if self.min_amount <= Decimal::ZERO {
            return Err(AmlError::config("min_amount must be positive"));
        }
        if self.max_hops < 2 {
            return Err(AmlError::config("max_hops must be at least 2"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmurfingConfig {
    /// Minimum number of distinct senders feeding one receiver.
    pub min_senders: usize,
    /// Minimum aggregate received inside one window.
    pub min_total: Amount,
    /// Rolling window in days.
    pub window_days: i64,
}

impl Default for SmurfingConfig {
    fn default() -> Self {
        Self {
            min_senders: 3,
            min_total: Decimal::from(150_000),
            window_days: 7,
        }
    }
}

impl SmurfingConfig {
    pub fn validate(&self) -> AmlResult<()> {
        if self.min_senders < 2 {
            return Err(AmlError::config("min_senders must be at least 2"));
        }
        if self.min_total <= Decimal::ZERO {
            return Err(AmlError::config("min_total must be positive"));
        }
        if self.window_days <= 0 {
            return Err(AmlError::config("window_days must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenerConfig {
    /// Fuzzy matches below this composite score are discarded.
    pub fuzzy_floor: f64,
    /// Multiplier applied to a fuzzy score when both dates of birth are
    /// present and disagree. Strictly below 1, so the penalty only ever
    /// lowers a score.
    pub dob_mismatch_penalty: f64,
    /// Maximum matches returned per screened entity.
    pub max_matches: usize,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            fuzzy_floor: 0.85,
            dob_mismatch_penalty: 0.75,
            max_matches: 10,
        }
    }
}

impl ScreenerConfig {
    pub fn validate(&self) -> AmlResult<()> {
        if !(0.0 < self.fuzzy_floor && self.fuzzy_floor <= 1.0) {
            return Err(AmlError::config("fuzzy_floor must be in (0, 1]"));
        }
        if !(0.0 < self.dob_mismatch_penalty && self.dob_mismatch_penalty < 1.0) {
            return Err(AmlError::config("dob_mismatch_penalty must be in (0, 1)"));
        }
        if self.max_matches == 0 {
            return Err(AmlError::config("max_matches must be at least 1"));
        }
        Ok(())
    }
}

/// Lower bounds of the transaction amount tiers used by the transaction
/// risk scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountTiers {
    pub medium: Amount,
    pub high: Amount,
    pub very_high: Amount,
    pub critical: Amount,
}

impl Default for AmountTiers {
    fn default() -> Self {
        Self {
            medium: Decimal::from(50_000),
            high: Decimal::from(150_000),
            very_high: Decimal::from(500_000),
            critical: Decimal::from(1_000_000),
        }
    }
}

impl AmountTiers {
    pub fn validate(&self) -> AmlResult<()> {
        let bands = [self.medium, self.high, self.very_high, self.critical];
        if bands.iter().any(|b| *b <= Decimal::ZERO) {
            return Err(AmlError::config("amount tiers must be positive"));
        }
        if bands.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AmlError::config("amount tiers must be strictly ascending"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Single cash transactions at or above this amount qualify for the
    /// direct CTR path.
    pub ctr_threshold: Amount,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            ctr_threshold: Decimal::from(150_000),
        }
    }
}

impl ReportConfig {
    pub fn validate(&self) -> AmlResult<()> {
        if self.ctr_threshold <= Decimal::ZERO {
            return Err(AmlError::config("ctr_threshold must be positive"));
        }
        Ok(())
    }
}
