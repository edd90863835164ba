use std::sync::Arc;

use super::domain::{
    CommissionQuote, CommissionRule, DealFacts, EnergyCommissionConfig, EnergyFacts,
    OrganizationId,
};
use super::import::{ImportError, SheetTable};
use super::matrix::CommissionMatrix;
use super::repository::MatrixRepository;
use super::store::{CommissionRuleStore, StoreError};

/// Service composing the rule store, evaluator, and import normalizer.
///
/// Quotes are computed against a freshly loaded snapshot; imports return the
/// edited configuration without persisting it, leaving the save to the caller.
pub struct CommissionService<R> {
    store: CommissionRuleStore<R>,
}

impl<R> CommissionService<R>
where
    R: MatrixRepository + 'static,
{
    pub fn new(repository: Arc<R>, products: Vec<String>) -> Self {
        Self {
            store: CommissionRuleStore::new(repository, products),
        }
    }

    pub fn products(&self) -> &[String] {
        self.store.products()
    }

    pub fn load(
        &self,
        organization: &OrganizationId,
    ) -> Result<CommissionMatrix, CommissionServiceError> {
        Ok(self.store.load(organization)?)
    }

    pub fn save(
        &self,
        organization: &OrganizationId,
        matrix: &CommissionMatrix,
    ) -> Result<(), CommissionServiceError> {
        Ok(self.store.save(organization, matrix)?)
    }

    /// Commission for a product sale using the organization's current rules.
    pub fn quote(
        &self,
        organization: &OrganizationId,
        product: &str,
        facts: &DealFacts,
    ) -> Result<CommissionQuote, CommissionServiceError> {
        let matrix = self.store.load(organization)?;
        matrix
            .quote(product, facts)
            .ok_or_else(|| CommissionServiceError::UnknownProduct(product.to_string()))
    }

    pub fn quote_energy(
        &self,
        organization: &OrganizationId,
        facts: &EnergyFacts,
    ) -> Result<CommissionQuote, CommissionServiceError> {
        let matrix = self.store.load(organization)?;
        Ok(matrix.quote_energy(facts))
    }

    /// Rule for `product` with the imported tiers appended. Not persisted.
    pub fn preview_tier_import(
        &self,
        organization: &OrganizationId,
        product: &str,
        table: &SheetTable,
    ) -> Result<CommissionRule, CommissionServiceError> {
        let mut matrix = self.store.load(organization)?;
        if !matrix.rules.contains_key(product) {
            return Err(CommissionServiceError::UnknownProduct(product.to_string()));
        }
        matrix.import_tiers(product, table)?;
        Ok(matrix.rules.remove(product).unwrap_or_default())
    }

    /// Energy configuration with the imported bands appended. Not persisted.
    pub fn preview_band_import(
        &self,
        organization: &OrganizationId,
        table: &SheetTable,
    ) -> Result<EnergyCommissionConfig, CommissionServiceError> {
        let mut matrix = self.store.load(organization)?;
        matrix.import_bands(table)?;
        Ok(matrix.energy)
    }
}

/// Error raised by the commission service.
#[derive(Debug, thiserror::Error)]
pub enum CommissionServiceError {
    #[error("no commission rule configured for product '{0}'")]
    UnknownProduct(String),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
