use crate::infra::InMemoryMatrixRepository;
use clap::{Args, ValueEnum};
use commission_engine::commission::import::{parse_bands, parse_tiers};
use commission_engine::commission::{
    BasePlusPerKwp, CommissionMatrix, CommissionQuote, CommissionRule, CommissionService,
    CommissionServiceError, ContractModel, DealFacts, EnergyFacts, EnergyMarginBand,
    FormulaPercentage, OrganizationId, PercentageValor, RuleMethod, SheetTable, Tier,
    ENERGY_RULE_KEY,
};
use commission_engine::config::DEFAULT_PRODUCTS;
use commission_engine::error::AppError;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum ContractModelArg {
    Transactional,
    Aas,
}

impl From<ContractModelArg> for ContractModel {
    fn from(value: ContractModelArg) -> Self {
        match value {
            ContractModelArg::Transactional => ContractModel::Transactional,
            ContractModelArg::Aas => ContractModel::Aas,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum ImportKind {
    Tiers,
    Bands,
}

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// JSON file holding a commission matrix or an organization record
    #[arg(long)]
    pub(crate) matrix: PathBuf,
    /// Product to quote; use `ee_gas` for energy/gas supply deals
    #[arg(long)]
    pub(crate) product: String,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) kwp: f64,
    /// Sale or proposal value
    #[arg(long, default_value_t = 0.0)]
    pub(crate) value: f64,
    #[arg(long, value_enum, default_value_t = ContractModelArg::Transactional)]
    pub(crate) contract_model: ContractModelArg,
    /// Energy deal margin (energy quotes only)
    #[arg(long, default_value_t = 0.0)]
    pub(crate) margin: f64,
    /// Annual energy volume in MWh (energy quotes only)
    #[arg(long, default_value_t = 0.0)]
    pub(crate) annual_volume_mwh: f64,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    #[arg(long, value_enum)]
    pub(crate) kind: ImportKind,
    /// Spreadsheet to read: .xlsx, .xls, or a CSV/TSV/TXT export
    pub(crate) path: PathBuf,
}

pub(crate) fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.matrix)?;
    let matrix = matrix_from_document(&raw)?;

    let quote = if args.product == ENERGY_RULE_KEY {
        matrix.quote_energy(&EnergyFacts {
            margin: args.margin,
            annual_volume_mwh: args.annual_volume_mwh,
        })
    } else {
        let facts = DealFacts {
            kwp: args.kwp,
            value: args.value,
            contract_model: args.contract_model.into(),
        };
        matrix
            .quote(&args.product, &facts)
            .ok_or_else(|| CommissionServiceError::UnknownProduct(args.product.clone()))?
    };

    println!("{}", serde_json::to_string_pretty(&quote)?);
    Ok(())
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let table = SheetTable::from_path(&args.path)?;
    let rows = match args.kind {
        ImportKind::Tiers => serde_json::to_value(parse_tiers(&table)?)?,
        ImportKind::Bands => serde_json::to_value(parse_bands(&table)?)?,
    };
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

pub(crate) fn run_demo() -> Result<(), AppError> {
    let organization = OrganizationId("demo-org".to_string());
    let products = DEFAULT_PRODUCTS.iter().map(|p| p.to_string()).collect();
    let service = CommissionService::new(Arc::new(InMemoryMatrixRepository::default()), products);

    service.save(&organization, &sample_matrix())?;
    let matrix = service.load(&organization)?;

    println!("=== Commission Engine Demo ===");
    println!("Organization: {organization}");
    println!("Configured products: {}", matrix.rules.len());
    println!();

    let deals = [
        ("Autoconsumo Residencial", 7.5, 9_000.0, ContractModel::Transactional),
        ("Autoconsumo Residencial", 25.0, 28_000.0, ContractModel::Aas),
        ("Baterias", 10.0, 6_500.0, ContractModel::Transactional),
        ("Cargadores VE", 0.0, 12_000.0, ContractModel::Transactional),
        ("Mantenimiento", 0.0, 1_200.0, ContractModel::Aas),
    ];

    println!("Product sales:");
    for (product, kwp, value, contract_model) in deals {
        let facts = DealFacts {
            kwp,
            value,
            contract_model,
        };
        let quote = service.quote(&organization, product, &facts)?;
        print_quote(&quote);
    }

    println!();
    println!("Energy/gas supply:");
    for (margin, annual_volume_mwh) in [(12.0, 250.0), (12.0, 450.0), (25.0, 900.0)] {
        let quote = service.quote_energy(
            &organization,
            &EnergyFacts {
                margin,
                annual_volume_mwh,
            },
        )?;
        print_quote(&quote);
    }

    Ok(())
}

fn print_quote(quote: &CommissionQuote) {
    let model = quote
        .contract_model
        .map(|model| format!(" ({})", model.label()))
        .unwrap_or_default();
    println!(
        "- {}{} via {}: {:.2} [{}]",
        quote.product, model, quote.method, quote.amount, quote.notes
    );
}

/// Accepts a bare matrix or an organization record wrapping one under
/// `commissionMatrix`.
fn matrix_from_document(raw: &str) -> Result<CommissionMatrix, serde_json::Error> {
    let document: Value = serde_json::from_str(raw)?;
    match document.get("commissionMatrix") {
        Some(matrix) => serde_json::from_value(matrix.clone()),
        None => serde_json::from_value(document),
    }
}

fn sample_matrix() -> CommissionMatrix {
    let mut matrix = CommissionMatrix::default();
    matrix.set_rule(
        "Autoconsumo Residencial",
        CommissionRule::tiered(vec![
            Tier {
                kwp_min: 0.0,
                kwp_max: 10.0,
                base_transaccional: 150.0,
                adic_transaccional: 20.0,
                base_aas: 100.0,
                adic_aas: 15.0,
            },
            Tier {
                kwp_min: 10.0,
                kwp_max: 30.0,
                base_transaccional: 350.0,
                adic_transaccional: 18.0,
                base_aas: 250.0,
                adic_aas: 12.0,
            },
        ]),
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
    matrix.set_rule(
        "Cargadores VE",
        CommissionRule::new(RuleMethod::FormulaPercentage(FormulaPercentage {
            factor: 1.5,
            divisor: 1_000.0,
            pct_transaccional: 4.0,
            pct_aas: 3.0,
        })),
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
            ponderador: 2.0,
            valor: 40.0,
        },
        EnergyMarginBand {
            margin_min: 10.0,
            ponderador: 3.0,
            valor: 60.0,
        },
        EnergyMarginBand {
            margin_min: 20.0,
            ponderador: 4.5,
            valor: 90.0,
        },
    ];
    matrix
}
