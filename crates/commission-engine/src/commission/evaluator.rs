//! Pure evaluation of the generic commission methods.
//!
//! Every function here is deterministic and infallible: misconfigured rules
//! (empty tables, zero divisors, non-finite inputs) evaluate to zero instead
//! of surfacing an error to the caller.

use super::domain::{
    BasePlusPerKwp, CommissionQuote, CommissionRule, ContractModel, DealFacts, FormulaPercentage,
    PercentageValor, RuleMethod, Tier,
};

impl CommissionRule {
    /// Commission amount for the given deal.
    pub fn evaluate(&self, facts: &DealFacts) -> f64 {
        self.quote("", facts).amount
    }

    /// Commission amount plus an audit note, labelled with `product`.
    pub fn quote(&self, product: &str, facts: &DealFacts) -> CommissionQuote {
        let model = facts.contract_model;
        let (amount, notes) = match &self.method {
            RuleMethod::TieredKwp => tiered_kwp(&self.tiers, facts.kwp, model),
            RuleMethod::BasePlusPerKwp(rate) => base_plus_per_kwp(rate, facts.kwp, model),
            RuleMethod::FormulaPercentage(formula) => {
                formula_percentage(formula, facts.value, model)
            }
            RuleMethod::PercentageValor(pct) => percentage_valor(pct, facts.value, model),
        };

        CommissionQuote {
            product: product.to_string(),
            method: self.method.name().to_string(),
            contract_model: Some(model),
            amount: finite_or_zero(amount),
            notes,
        }
    }
}

/// Locates the tier covering `kwp`: `kwp_min <= kwp < kwp_max`, falling back to
/// the tier with the greatest `kwp_max` once `kwp` reaches or passes it.
pub fn select_tier(tiers: &[Tier], kwp: f64) -> Option<(usize, &Tier)> {
    if !kwp.is_finite() {
        return None;
    }

    if let Some(found) = tiers
        .iter()
        .enumerate()
        .find(|(_, tier)| tier.kwp_min <= kwp && kwp < tier.kwp_max)
    {
        return Some(found);
    }

    let (index, terminal) = tiers
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.kwp_max.total_cmp(&b.kwp_max))?;

    if kwp >= terminal.kwp_max && kwp >= terminal.kwp_min {
        Some((index, terminal))
    } else {
        None
    }
}

fn tiered_kwp(tiers: &[Tier], kwp: f64, model: ContractModel) -> (f64, String) {
    if tiers.is_empty() {
        return (0.0, "no tiers configured".to_string());
    }

    let Some((index, tier)) = select_tier(tiers, kwp) else {
        return (0.0, format!("{kwp} kWp outside every configured tier"));
    };

    let (base, adic) = tier.coefficients(model);
    let amount = base + (kwp - tier.kwp_min) * adic;
    let notes = format!(
        "tier {} [{} - {}) kWp: {} + ({} - {}) x {}",
        index + 1,
        tier.kwp_min,
        tier.kwp_max,
        base,
        kwp,
        tier.kwp_min,
        adic
    );
    (amount, notes)
}

fn base_plus_per_kwp(rate: &BasePlusPerKwp, kwp: f64, model: ContractModel) -> (f64, String) {
    let (base, per_kwp) = match model {
        ContractModel::Transactional => (rate.base_transaccional, rate.per_kwp_transaccional),
        ContractModel::Aas => (rate.base_aas, rate.per_kwp_aas),
    };
    let amount = base + per_kwp * finite_or_zero(kwp);
    (amount, format!("{base} + {per_kwp} x {kwp} kWp"))
}

/// Effective kWp derived from a proposal value; zero when `divisor` is zero.
pub fn derived_kwp(formula: &FormulaPercentage, value: f64) -> f64 {
    if formula.divisor == 0.0 {
        return 0.0;
    }
    finite_or_zero(finite_or_zero(value) * formula.factor / formula.divisor)
}

fn formula_percentage(
    formula: &FormulaPercentage,
    value: f64,
    model: ContractModel,
) -> (f64, String) {
    let pct = match model {
        ContractModel::Transactional => formula.pct_transaccional,
        ContractModel::Aas => formula.pct_aas,
    };
    let derived = derived_kwp(formula, value);
    let amount = derived * pct / 100.0;
    let notes = format!(
        "({value} x {}) / {} = {derived} kWp at {pct}%",
        formula.factor, formula.divisor
    );
    (amount, notes)
}

fn percentage_valor(pct: &PercentageValor, value: f64, model: ContractModel) -> (f64, String) {
    let pct = match model {
        ContractModel::Transactional => pct.pct_transaccional,
        ContractModel::Aas => pct.pct_aas,
    };
    let amount = finite_or_zero(value) * pct / 100.0;
    (amount, format!("{pct}% of {value}"))
}

pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
