//! Commission calculation engine: per-organization rule store, pure formula
//! evaluator, and spreadsheet import of tier and margin-band tables.

pub mod commission;
pub mod config;
pub mod error;
pub mod telemetry;
