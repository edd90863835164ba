//! Commission rule evaluation engine.
//!
//! Rules are configured per product in a [`CommissionMatrix`] that is loaded,
//! edited, and saved as a whole. Evaluation is pure and works on an immutable
//! snapshot of the matrix.

pub mod domain;
pub mod energy;
pub mod evaluator;
pub mod import;
pub mod matrix;
pub mod migration;
pub mod repository;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    BasePlusPerKwp, CommissionQuote, CommissionRule, ContractModel, DealFacts,
    EnergyCommissionConfig, EnergyFacts, EnergyMarginBand, FormulaPercentage, OrganizationId,
    PercentageValor, RuleMethod, Tier, VolumeMultipliers, VolumeTier, ENERGY_RULE_KEY,
};
pub use import::{ImportError, SheetTable, TierField};
pub use matrix::CommissionMatrix;
pub use repository::{MatrixRepository, RepositoryError};
pub use router::{commission_router, QuoteRequest};
pub use service::{CommissionService, CommissionServiceError};
pub use store::{CommissionRuleStore, StoreError};
