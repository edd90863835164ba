use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ContractModel, DealFacts, EnergyFacts, OrganizationId};
use super::import::SheetTable;
use super::matrix::CommissionMatrix;
use super::repository::{MatrixRepository, RepositoryError};
use super::service::{CommissionService, CommissionServiceError};
use super::store::StoreError;

/// Quote request for a product sale.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub product: String,
    #[serde(default)]
    pub kwp: f64,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub contract_model: ContractModel,
}

impl QuoteRequest {
    pub fn facts(&self) -> DealFacts {
        DealFacts {
            kwp: self.kwp,
            value: self.value,
            contract_model: self.contract_model,
        }
    }
}

/// Router builder exposing the commission matrix and quote endpoints.
pub fn commission_router<R>(service: Arc<CommissionService<R>>) -> Router
where
    R: MatrixRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/organizations/:organization_id/commission-matrix",
            get(load_handler::<R>).put(save_handler::<R>),
        )
        .route(
            "/api/v1/organizations/:organization_id/commission-matrix/quote",
            post(quote_handler::<R>),
        )
        .route(
            "/api/v1/organizations/:organization_id/commission-matrix/energy-quote",
            post(energy_quote_handler::<R>),
        )
        .route(
            "/api/v1/organizations/:organization_id/commission-matrix/products/:product/tiers/import",
            post(tier_import_handler::<R>),
        )
        .route(
            "/api/v1/organizations/:organization_id/commission-matrix/energy/bands/import",
            post(band_import_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn load_handler<R>(
    State(service): State<Arc<CommissionService<R>>>,
    Path(organization_id): Path<String>,
) -> Response
where
    R: MatrixRepository + 'static,
{
    match service.load(&OrganizationId(organization_id)) {
        Ok(matrix) => (StatusCode::OK, Json(matrix)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn save_handler<R>(
    State(service): State<Arc<CommissionService<R>>>,
    Path(organization_id): Path<String>,
    Json(matrix): Json<CommissionMatrix>,
) -> Response
where
    R: MatrixRepository + 'static,
{
    match service.save(&OrganizationId(organization_id), &matrix) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn quote_handler<R>(
    State(service): State<Arc<CommissionService<R>>>,
    Path(organization_id): Path<String>,
    Json(request): Json<QuoteRequest>,
) -> Response
where
    R: MatrixRepository + 'static,
{
    let organization = OrganizationId(organization_id);
    match service.quote(&organization, &request.product, &request.facts()) {
        Ok(quote) => (StatusCode::OK, Json(quote)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn energy_quote_handler<R>(
    State(service): State<Arc<CommissionService<R>>>,
    Path(organization_id): Path<String>,
    Json(facts): Json<EnergyFacts>,
) -> Response
where
    R: MatrixRepository + 'static,
{
    match service.quote_energy(&OrganizationId(organization_id), &facts) {
        Ok(quote) => (StatusCode::OK, Json(quote)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn tier_import_handler<R>(
    State(service): State<Arc<CommissionService<R>>>,
    Path((organization_id, product)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    R: MatrixRepository + 'static,
{
    let table = match uploaded_table(&headers, &body) {
        Ok(table) => table,
        Err(error) => return error_response(error),
    };
    let organization = OrganizationId(organization_id);
    match service.preview_tier_import(&organization, &product, &table) {
        Ok(rule) => (StatusCode::OK, Json(rule)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn band_import_handler<R>(
    State(service): State<Arc<CommissionService<R>>>,
    Path(organization_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    R: MatrixRepository + 'static,
{
    let table = match uploaded_table(&headers, &body) {
        Ok(table) => table,
        Err(error) => return error_response(error),
    };
    match service.preview_band_import(&OrganizationId(organization_id), &table) {
        Ok(energy) => (StatusCode::OK, Json(energy)).into_response(),
        Err(error) => error_response(error),
    }
}

/// Spreadsheet body as CSV/TSV text or an `.xlsx`/`.xls` workbook.
fn uploaded_table(
    headers: &HeaderMap,
    body: &[u8],
) -> Result<SheetTable, CommissionServiceError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    Ok(SheetTable::from_upload(content_type, body)?)
}

fn error_response(error: CommissionServiceError) -> Response {
    let status = match &error {
        CommissionServiceError::UnknownProduct(_) => StatusCode::NOT_FOUND,
        CommissionServiceError::Import(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CommissionServiceError::Store(StoreError::Repository(RepositoryError::NotFound)) => {
            StatusCode::NOT_FOUND
        }
        CommissionServiceError::Store(StoreError::Repository(RepositoryError::Unavailable(_))) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        CommissionServiceError::Store(StoreError::Serialization(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}
