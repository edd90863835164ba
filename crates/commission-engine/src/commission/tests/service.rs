use super::common::*;
use crate::commission::domain::{ContractModel, DealFacts, EnergyFacts, OrganizationId};
use crate::commission::import::ImportError;
use crate::commission::repository::RepositoryError;
use crate::commission::service::{CommissionService, CommissionServiceError};
use crate::commission::store::StoreError;
use std::sync::Arc;

fn deal(kwp: f64, value: f64, contract_model: ContractModel) -> DealFacts {
    DealFacts {
        kwp,
        value,
        contract_model,
    }
}

#[test]
fn quote_uses_persisted_rules() {
    let (service, _) = build_service();
    service
        .save(&organization(), &configured_matrix())
        .expect("saves");

    let quote = service
        .quote(
            &organization(),
            "Autoconsumo",
            &deal(12.0, 0.0, ContractModel::Transactional),
        )
        .expect("quote");
    assert_eq!(quote.amount, 150.0 + 2.0 * 4.0);
    assert_eq!(quote.method, "tiered_kwp");

    let aas = service
        .quote(
            &organization(),
            "Mantenimiento",
            &deal(0.0, 2_000.0, ContractModel::Aas),
        )
        .expect("quote");
    assert_eq!(aas.amount, 240.0);
}

#[test]
fn quote_for_unconfigured_catalog_product_is_zero() {
    let (service, _) = build_service();
    let quote = service
        .quote(
            &OrganizationId("fresh-org".to_string()),
            "Baterias",
            &deal(25.0, 9_000.0, ContractModel::Transactional),
        )
        .expect("default rule quotes");
    assert_eq!(quote.amount, 0.0);
}

#[test]
fn quote_rejects_unknown_product() {
    let (service, _) = build_service();
    match service.quote(
        &organization(),
        "Aerotermia",
        &deal(5.0, 1_000.0, ContractModel::Transactional),
    ) {
        Err(CommissionServiceError::UnknownProduct(product)) => assert_eq!(product, "Aerotermia"),
        other => panic!("expected unknown product, got {other:?}"),
    }
}

#[test]
fn energy_quote_applies_volume_tier() {
    let (service, _) = build_service();
    service
        .save(&organization(), &configured_matrix())
        .expect("saves");

    let reference = service
        .quote_energy(
            &organization(),
            &EnergyFacts {
                margin: 10.0,
                annual_volume_mwh: 450.0,
            },
        )
        .expect("quote");
    assert_eq!(reference.amount, 250.0);

    let high = service
        .quote_energy(
            &organization(),
            &EnergyFacts {
                margin: 10.0,
                annual_volume_mwh: 900.0,
            },
        )
        .expect("quote");
    assert_eq!(high.amount, 375.0);
}

#[test]
fn tier_import_preview_appends_without_saving() {
    let (service, repository) = build_service();
    service
        .save(&organization(), &configured_matrix())
        .expect("saves");
    let before = repository.stored(&organization());

    let rule = service
        .preview_tier_import(
            &organization(),
            "Autoconsumo",
            &sheet("kWp Min;kWp Max;Base Trans.;Adic. Trans.\n50;100;310;3,5\n"),
        )
        .expect("imports");

    assert_eq!(rule.tiers.len(), 3);
    assert_eq!(rule.tiers[2].adic_transaccional, 3.5);
    assert_eq!(repository.stored(&organization()), before);
}

#[test]
fn tier_import_rejects_unrecognized_columns() {
    let (service, _) = build_service();
    let table = sheet("foo,bar\n1,2\n");
    match service.preview_tier_import(&organization(), "Autoconsumo", &table) {
        Err(CommissionServiceError::Import(ImportError::NoRecognizedColumns { .. })) => {}
        other => panic!("expected import error, got {other:?}"),
    }
}

#[test]
fn band_import_preview_appends_bands() {
    let (service, _) = build_service();
    service
        .save(&organization(), &configured_matrix())
        .expect("saves");

    let energy = service
        .preview_band_import(&organization(), &sheet("Margen,Ponderador,Valor\n20,8,400\n"))
        .expect("imports");
    assert_eq!(energy.bands.len(), 3);
    assert_eq!(energy.bands[2].margin_min, 20.0);
}

#[test]
fn save_failure_leaves_caller_matrix_intact() {
    let repository = Arc::new(ReadOnlyRepository::default());
    let service = CommissionService::new(repository, products());
    let matrix = configured_matrix();
    let snapshot = matrix.clone();

    match service.save(&organization(), &matrix) {
        Err(CommissionServiceError::Store(StoreError::Repository(
            RepositoryError::Unavailable(_),
        ))) => {}
        other => panic!("expected unavailable repository, got {other:?}"),
    }
    assert_eq!(matrix, snapshot);
}

#[test]
fn load_propagates_repository_errors() {
    let service = CommissionService::new(Arc::new(UnavailableRepository), products());
    assert!(matches!(
        service.load(&organization()),
        Err(CommissionServiceError::Store(StoreError::Repository(
            RepositoryError::Unavailable(_)
        )))
    ));
}
