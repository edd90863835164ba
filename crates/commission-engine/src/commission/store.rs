use super::domain::OrganizationId;
use super::matrix::CommissionMatrix;
use super::migration::migrate_matrix;
use super::repository::{MatrixRepository, RepositoryError};
use std::sync::Arc;
use tracing::{debug, info};

/// Loads and saves whole commission matrices for an organization.
///
/// Loading materializes a default rule for every catalog product without one;
/// saving overwrites the stored blob (last writer wins).
pub struct CommissionRuleStore<R> {
    repository: Arc<R>,
    products: Vec<String>,
}

impl<R> CommissionRuleStore<R>
where
    R: MatrixRepository + 'static,
{
    pub fn new(repository: Arc<R>, products: Vec<String>) -> Self {
        Self {
            repository,
            products,
        }
    }

    pub fn products(&self) -> &[String] {
        &self.products
    }

    pub fn load(&self, organization: &OrganizationId) -> Result<CommissionMatrix, StoreError> {
        let raw = self.repository.fetch(organization)?;
        debug!(%organization, stored = raw.is_some(), "loading commission matrix");
        Ok(migrate_matrix(raw.as_ref(), &self.products))
    }

    pub fn save(
        &self,
        organization: &OrganizationId,
        matrix: &CommissionMatrix,
    ) -> Result<(), StoreError> {
        let blob = matrix.to_value()?;
        self.repository.replace(organization, blob)?;
        info!(
            %organization,
            products = matrix.rules.len(),
            bands = matrix.energy.bands.len(),
            "commission matrix saved"
        );
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("commission matrix could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}
