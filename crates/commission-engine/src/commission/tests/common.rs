use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::{json, Value};

use crate::commission::domain::{
    BasePlusPerKwp, CommissionRule, EnergyMarginBand, FormulaPercentage, OrganizationId,
    PercentageValor, RuleMethod, Tier,
};
use crate::commission::import::SheetTable;
use crate::commission::matrix::CommissionMatrix;
use crate::commission::repository::{MatrixRepository, RepositoryError};
use crate::commission::{commission_router, CommissionService};

pub(super) fn organization() -> OrganizationId {
    OrganizationId("org-001".to_string())
}

pub(super) fn products() -> Vec<String> {
    vec![
        "Autoconsumo".to_string(),
        "Baterias".to_string(),
        "Cargadores VE".to_string(),
        "Mantenimiento".to_string(),
    ]
}

pub(super) fn tier(kwp_min: f64, kwp_max: f64, base: f64, adic: f64) -> Tier {
    Tier {
        kwp_min,
        kwp_max,
        base_transaccional: base,
        adic_transaccional: adic,
        base_aas: base + 20.0,
        adic_aas: adic + 1.0,
    }
}

pub(super) fn sheet(text: &str) -> SheetTable {
    SheetTable::from_csv_str(text).expect("sheet reads")
}

pub(super) fn configured_matrix() -> CommissionMatrix {
    let mut matrix = CommissionMatrix::default();
    matrix.set_rule(
        "Autoconsumo",
        CommissionRule::tiered(vec![tier(0.0, 10.0, 100.0, 5.0), tier(10.0, 50.0, 150.0, 4.0)]),
    );
    matrix.set_rule(
        "Baterias",
        CommissionRule::new(RuleMethod::BasePlusPerKwp(BasePlusPerKwp {
            base_transaccional: 120.0,
            per_kwp_transaccional: 10.0,
            base_aas: 80.0,
            per_kwp_aas: 8.0,
        })),
    );
    // Tiers left over from an earlier tiered configuration are kept as-is.
    matrix.set_rule(
        "Cargadores VE",
        CommissionRule {
            method: RuleMethod::FormulaPercentage(FormulaPercentage {
                factor: 1.5,
                divisor: 1_000.0,
                pct_transaccional: 4.0,
                pct_aas: 3.0,
            }),
            tiers: vec![tier(0.0, 7.4, 60.0, 0.0)],
        },
    );
    matrix.set_rule(
        "Mantenimiento",
        CommissionRule::new(RuleMethod::PercentageValor(PercentageValor {
            pct_transaccional: 10.0,
            pct_aas: 12.0,
        })),
    );
    matrix.energy.bands = vec![
        EnergyMarginBand {
            margin_min: 0.0,
            ponderador: 4.0,
            valor: 100.0,
        },
        EnergyMarginBand {
            margin_min: 10.0,
            ponderador: 6.0,
            valor: 250.0,
        },
    ];
    matrix
}

/// Legacy blob as written before the method set was closed.
pub(super) fn legacy_blob() -> Value {
    json!({
        "Autoconsumo": {
            "method": "escalado",
            "tiers": [{ "kwpMin": 0, "kwpMax": 10, "baseTransaccional": 90, "adicTransaccional": 3 }],
        },
        "Mantenimiento": { "method": "percentage_valor", "pctTransaccional": 10 },
    })
}

pub(super) fn build_service() -> (Arc<CommissionService<MemoryRepository>>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = Arc::new(CommissionService::new(repository.clone(), products()));
    (service, repository)
}

pub(super) fn router_with_service(
    service: Arc<CommissionService<MemoryRepository>>,
) -> axum::Router {
    commission_router(service)
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    blobs: Mutex<HashMap<OrganizationId, Value>>,
}

impl MemoryRepository {
    pub(super) fn seed(&self, organization: &OrganizationId, blob: Value) {
        self.blobs
            .lock()
            .expect("repository mutex poisoned")
            .insert(organization.clone(), blob);
    }

    pub(super) fn stored(&self, organization: &OrganizationId) -> Option<Value> {
        self.blobs
            .lock()
            .expect("repository mutex poisoned")
            .get(organization)
            .cloned()
    }
}

impl MatrixRepository for MemoryRepository {
    fn fetch(&self, organization: &OrganizationId) -> Result<Option<Value>, RepositoryError> {
        Ok(self.stored(organization))
    }

    fn replace(&self, organization: &OrganizationId, blob: Value) -> Result<(), RepositoryError> {
        self.seed(organization, blob);
        Ok(())
    }
}

/// Repository whose reads succeed but whose writes always fail.
#[derive(Default)]
pub(super) struct ReadOnlyRepository {
    pub(super) inner: MemoryRepository,
}

impl MatrixRepository for ReadOnlyRepository {
    fn fetch(&self, organization: &OrganizationId) -> Result<Option<Value>, RepositoryError> {
        self.inner.fetch(organization)
    }

    fn replace(&self, _organization: &OrganizationId, _blob: Value) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("backend offline".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl MatrixRepository for UnavailableRepository {
    fn fetch(&self, _organization: &OrganizationId) -> Result<Option<Value>, RepositoryError> {
        Err(RepositoryError::Unavailable("backend offline".to_string()))
    }

    fn replace(&self, _organization: &OrganizationId, _blob: Value) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("backend offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&body).expect("body is json")
}
