use chrono::{DateTime, Utc};
use commission_engine::commission::{MatrixRepository, OrganizationId, RepositoryError};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryMatrixRepository {
    blobs: Arc<Mutex<HashMap<OrganizationId, Value>>>,
}

impl MatrixRepository for InMemoryMatrixRepository {
    fn fetch(&self, organization: &OrganizationId) -> Result<Option<Value>, RepositoryError> {
        let guard = self.blobs.lock().expect("repository mutex poisoned");
        Ok(guard.get(organization).cloned())
    }

    fn replace(&self, organization: &OrganizationId, blob: Value) -> Result<(), RepositoryError> {
        let mut guard = self.blobs.lock().expect("repository mutex poisoned");
        guard.insert(organization.clone(), blob);
        Ok(())
    }
}

/// Organization record as persisted by the file repository; the commission
/// matrix is one field of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrganizationRecord {
    pub(crate) organization_id: String,
    pub(crate) commission_matrix: Value,
    pub(crate) updated_at: DateTime<Utc>,
}

/// Stores one JSON organization record per file under `root`.
#[derive(Debug, Clone)]
pub(crate) struct JsonFileMatrixRepository {
    root: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonFileMatrixRepository {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    fn record_path(&self, organization: &OrganizationId) -> PathBuf {
        let file_name: String = organization
            .0
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{file_name}.json"))
    }

    fn read_record(path: &Path) -> Result<Option<OrganizationRecord>, RepositoryError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(unavailable(err)),
        };
        serde_json::from_slice(&bytes).map(Some).map_err(unavailable)
    }
}

impl MatrixRepository for JsonFileMatrixRepository {
    fn fetch(&self, organization: &OrganizationId) -> Result<Option<Value>, RepositoryError> {
        let _guard = self.lock.lock().expect("repository mutex poisoned");
        let record = Self::read_record(&self.record_path(organization))?;
        Ok(record.map(|record| record.commission_matrix))
    }

    fn replace(&self, organization: &OrganizationId, blob: Value) -> Result<(), RepositoryError> {
        let _guard = self.lock.lock().expect("repository mutex poisoned");
        std::fs::create_dir_all(&self.root).map_err(unavailable)?;

        let record = OrganizationRecord {
            organization_id: organization.0.clone(),
            commission_matrix: blob,
            updated_at: Utc::now(),
        };
        let path = self.record_path(organization);
        let staging = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(&record).map_err(unavailable)?;
        std::fs::write(&staging, bytes).map_err(unavailable)?;
        std::fs::rename(&staging, &path).map_err(unavailable)?;
        Ok(())
    }
}

/// Repository chosen at startup from `COMMISSION_DATA_DIR`.
#[derive(Clone)]
pub(crate) enum ConfiguredRepository {
    Memory(InMemoryMatrixRepository),
    File(JsonFileMatrixRepository),
}

impl ConfiguredRepository {
    pub(crate) fn from_data_dir(data_dir: Option<&Path>) -> Self {
        match data_dir {
            Some(dir) => Self::File(JsonFileMatrixRepository::new(dir)),
            None => Self::Memory(InMemoryMatrixRepository::default()),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Memory(_) => "in-memory".to_string(),
            Self::File(repo) => format!("json files in {}", repo.root.display()),
        }
    }
}

impl MatrixRepository for ConfiguredRepository {
    fn fetch(&self, organization: &OrganizationId) -> Result<Option<Value>, RepositoryError> {
        match self {
            Self::Memory(repo) => repo.fetch(organization),
            Self::File(repo) => repo.fetch(organization),
        }
    }

    fn replace(&self, organization: &OrganizationId, blob: Value) -> Result<(), RepositoryError> {
        match self {
            Self::Memory(repo) => repo.replace(organization, blob),
            Self::File(repo) => repo.replace(organization, blob),
        }
    }
}

fn unavailable(err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Unavailable(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "commission-engine-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn file_repository_round_trips_blob() {
        let dir = scratch_dir("round-trip");
        let repository = JsonFileMatrixRepository::new(&dir);
        let organization = OrganizationId("acme/solar".to_string());
        let blob = json!({ "Autoconsumo": { "method": "tiered_kwp", "tiers": [] } });

        assert_eq!(repository.fetch(&organization).expect("fetch"), None);
        repository
            .replace(&organization, blob.clone())
            .expect("replace");
        assert_eq!(repository.fetch(&organization).expect("fetch"), Some(blob));
        assert!(dir.join("acme_solar.json").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_repository_reports_corrupt_records() {
        let dir = scratch_dir("corrupt");
        std::fs::create_dir_all(&dir).expect("create dir");
        std::fs::write(dir.join("org.json"), b"not json").expect("write");
        let repository = JsonFileMatrixRepository::new(&dir);

        match repository.fetch(&OrganizationId("org".to_string())) {
            Err(RepositoryError::Unavailable(_)) => {}
            other => panic!("expected unavailable error, got {other:?}"),
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn configured_repository_defaults_to_memory() {
        let repository = ConfiguredRepository::from_data_dir(None);
        assert_eq!(repository.describe(), "in-memory");
        let organization = OrganizationId("org".to_string());
        repository
            .replace(&organization, json!({}))
            .expect("replace");
        assert_eq!(repository.fetch(&organization).expect("fetch"), Some(json!({})));
    }
}
