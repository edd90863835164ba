//! Conversion of persisted commission blobs into typed rules.
//!
//! Stored rules predate the closed set of methods. Anything whose `method` is
//! not recognized is rewritten as `percentage_valor` while keeping its tier
//! table, so configured breakpoints are never dropped by a load/save cycle.

use super::domain::{
    CommissionRule, EnergyCommissionConfig, EnergyMarginBand, PercentageValor, RuleMethod, Tier,
    VolumeMultipliers, ENERGY_RULE_KEY,
};
use super::import::parse_locale_number;
use super::matrix::CommissionMatrix;
use serde_json::{Map, Value};
use tracing::warn;

/// Typed rule for one stored rule value. `None` when the value is not an object.
///
/// A recognized method is never changed: unreadable coefficients read as `0`
/// and unreadable tier rows are skipped one at a time.
pub fn migrate_rule(raw: &Value) -> Option<CommissionRule> {
    let object = raw.as_object()?;
    let name = object.get("method").and_then(Value::as_str).unwrap_or("");

    if !RuleMethod::is_known(name) {
        return Some(coerce_legacy_rule(object));
    }

    let mut coefficients = object.clone();
    coefficients.remove("tiers");
    let method = serde_json::from_value::<RuleMethod>(Value::Object(coefficients))
        .ok()
        .or_else(|| RuleMethod::zeroed(name))?;

    Some(CommissionRule {
        method,
        tiers: migrate_tiers(object.get("tiers")),
    })
}

/// Rewrites an unrecognized rule as `percentage_valor`, keeping tiers and any
/// readable percentages.
pub fn coerce_legacy_rule(object: &Map<String, Value>) -> CommissionRule {
    CommissionRule {
        method: RuleMethod::PercentageValor(PercentageValor {
            pct_transaccional: number_field(object, "pctTransaccional"),
            pct_aas: number_field(object, "pctAas"),
        }),
        tiers: migrate_tiers(object.get("tiers")),
    }
}

/// Reads a stored tier table row by row.
pub fn migrate_tiers(raw: Option<&Value>) -> Vec<Tier> {
    match raw {
        Some(Value::Array(rows)) => rows
            .iter()
            .enumerate()
            .filter_map(|(index, row)| match serde_json::from_value::<Tier>(row.clone()) {
                Ok(tier) => Some(tier),
                Err(_) => {
                    warn!(row = index, kind = value_kind(row), "unreadable tier row skipped");
                    None
                }
            })
            .collect(),
        None | Some(Value::Null) => Vec::new(),
        Some(other) => {
            warn!(kind = value_kind(other), "tier table is not a list");
            Vec::new()
        }
    }
}

/// Energy configuration read band by band. `None` when the value is not an
/// object.
pub fn migrate_energy(raw: &Value) -> Option<EnergyCommissionConfig> {
    let object = raw.as_object()?;

    let bands = match object.get("bands") {
        Some(Value::Array(rows)) => rows
            .iter()
            .enumerate()
            .filter_map(|(index, row)| {
                match serde_json::from_value::<EnergyMarginBand>(row.clone()) {
                    Ok(band) => Some(band),
                    Err(_) => {
                        warn!(
                            row = index,
                            kind = value_kind(row),
                            "unreadable margin band skipped"
                        );
                        None
                    }
                }
            })
            .collect(),
        _ => Vec::new(),
    };
    let volume_multipliers = object
        .get("volumeMultipliers")
        .and_then(|raw| serde_json::from_value::<VolumeMultipliers>(raw.clone()).ok())
        .unwrap_or_default();

    Some(EnergyCommissionConfig {
        bands,
        volume_multipliers,
    })
}

/// Builds a matrix from a stored blob and materializes defaults for `products`.
///
/// Rules that cannot be read are replaced by the default tiered rule; a blob
/// that is not an object yields an all-default matrix.
pub fn migrate_matrix(raw: Option<&Value>, products: &[String]) -> CommissionMatrix {
    let mut matrix = CommissionMatrix::default();

    match raw {
        Some(Value::Object(entries)) => {
            for (key, value) in entries {
                if key == ENERGY_RULE_KEY {
                    match migrate_energy(value) {
                        Some(energy) => matrix.energy = energy,
                        None => warn!(key = %key, "unreadable energy configuration replaced with defaults"),
                    }
                    continue;
                }

                match migrate_rule(value) {
                    Some(rule) => {
                        let stored_method = value.get("method").and_then(Value::as_str);
                        if stored_method != Some(rule.method.name()) {
                            warn!(
                                product = %key,
                                stored_method = stored_method.unwrap_or("<missing>"),
                                "coerced legacy commission method to percentage_valor"
                            );
                        }
                        matrix.rules.insert(key.clone(), rule);
                    }
                    None => warn!(product = %key, "unreadable commission rule dropped"),
                }
            }
        }
        Some(Value::Null) | None => {}
        Some(other) => warn!(kind = value_kind(other), "commission matrix blob is not an object"),
    }

    for product in products {
        matrix.rules.entry(product.clone()).or_default();
    }

    matrix
}

fn number_field(object: &Map<String, Value>, key: &str) -> f64 {
    match object.get(key) {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => parse_locale_number(text),
        _ => 0.0,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
