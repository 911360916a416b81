//! Financial-crime detection core: typology detectors over transaction
//! batches, entity and transaction risk scoring, watchlist screening, and
//! the suspicious-activity report workflow.
//!
//! The core is a pure library. Persistence, ingestion, and case management
//! live with the callers; every operation here is a deterministic function
//! of its inputs and its configuration.

pub mod config;
pub mod detector;
pub mod entity_risk;
pub mod error;
pub mod graph;
pub mod layering;
pub mod orchestrator;
pub mod rapid_movement;
pub mod report_generator;
pub mod risk;
pub mod round_trip;
pub mod sar;
pub mod smurfing;
pub mod structuring;
pub mod transaction_risk;
pub mod types;
pub mod watchlist;

pub use error::{AmlError, AmlResult};
pub use types::{Amount, EntityId, PatternKind, PatternMatch, Severity, Transaction, TransactionId};
