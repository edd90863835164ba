use super::domain::OrganizationId;
use serde_json::Value;

/// Storage abstraction over the organization record field holding the raw
/// commission blob, so the store can be exercised without the backend.
pub trait MatrixRepository: Send + Sync {
    /// Raw stored blob, or `None` when the organization never saved one.
    fn fetch(&self, organization: &OrganizationId) -> Result<Option<Value>, RepositoryError>;
    /// Overwrites the stored blob in full.
    fn replace(&self, organization: &OrganizationId, blob: Value) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("organization not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
