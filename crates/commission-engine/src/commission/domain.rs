use super::import::parse_locale_number;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Reserved matrix key holding the energy/gas margin-band configuration.
pub const ENERGY_RULE_KEY: &str = "ee_gas";

pub const DEFAULT_LOW_VOLUME_MULTIPLIER: f64 = 1.33;
pub const DEFAULT_HIGH_VOLUME_MULTIPLIER: f64 = 1.5;

/// Reads a stored coefficient. Nulls and other non-numbers become `0`, and
/// numeric strings go through the spreadsheet number parser, so a single bad
/// cell never rejects the surrounding rule.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => parse_locale_number(&text),
        _ => 0.0,
    })
}

/// Organization identifier as stored by the host application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrganizationId(pub String);

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contract pricing model of a deal; selects which coefficient pair applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractModel {
    #[default]
    Transactional,
    Aas,
}

impl ContractModel {
    pub fn label(&self) -> &'static str {
        match self {
            ContractModel::Transactional => "transactional",
            ContractModel::Aas => "aas",
        }
    }
}

/// One breakpoint row of a tiered kWp table.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tier {
    #[serde(deserialize_with = "lenient_number")]
    pub kwp_min: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub kwp_max: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub base_transaccional: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub adic_transaccional: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub base_aas: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub adic_aas: f64,
}

impl Tier {
    /// Returns the `(base, adic)` coefficient pair for the contract model.
    pub fn coefficients(&self, model: ContractModel) -> (f64, f64) {
        match model {
            ContractModel::Transactional => (self.base_transaccional, self.adic_transaccional),
            ContractModel::Aas => (self.base_aas, self.adic_aas),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BasePlusPerKwp {
    #[serde(deserialize_with = "lenient_number")]
    pub base_transaccional: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub per_kwp_transaccional: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub base_aas: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub per_kwp_aas: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormulaPercentage {
    #[serde(deserialize_with = "lenient_number")]
    pub factor: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub divisor: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub pct_transaccional: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub pct_aas: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PercentageValor {
    #[serde(deserialize_with = "lenient_number")]
    pub pct_transaccional: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub pct_aas: f64,
}

/// Calculation method of a rule; each variant carries only its own coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum RuleMethod {
    TieredKwp,
    BasePlusPerKwp(BasePlusPerKwp),
    FormulaPercentage(FormulaPercentage),
    PercentageValor(PercentageValor),
}

impl RuleMethod {
    pub const NAMES: [&'static str; 4] = [
        "tiered_kwp",
        "base_plus_per_kwp",
        "formula_percentage",
        "percentage_valor",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RuleMethod::TieredKwp => "tiered_kwp",
            RuleMethod::BasePlusPerKwp(_) => "base_plus_per_kwp",
            RuleMethod::FormulaPercentage(_) => "formula_percentage",
            RuleMethod::PercentageValor(_) => "percentage_valor",
        }
    }

    pub fn is_known(name: &str) -> bool {
        Self::NAMES.contains(&name)
    }

    /// The named method with every coefficient at zero.
    pub fn zeroed(name: &str) -> Option<Self> {
        match name {
            "tiered_kwp" => Some(RuleMethod::TieredKwp),
            "base_plus_per_kwp" => Some(RuleMethod::BasePlusPerKwp(BasePlusPerKwp::default())),
            "formula_percentage" => {
                Some(RuleMethod::FormulaPercentage(FormulaPercentage::default()))
            }
            "percentage_valor" => Some(RuleMethod::PercentageValor(PercentageValor::default())),
            _ => None,
        }
    }
}

/// Commission rule configured for one product.
///
/// `tiers` is only consulted by [`RuleMethod::TieredKwp`]; it is kept when the
/// method changes so a configured table survives switching back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRule {
    #[serde(flatten)]
    pub method: RuleMethod,
    #[serde(default)]
    pub tiers: Vec<Tier>,
}

impl Default for CommissionRule {
    fn default() -> Self {
        Self {
            method: RuleMethod::TieredKwp,
            tiers: Vec::new(),
        }
    }
}

impl CommissionRule {
    pub fn new(method: RuleMethod) -> Self {
        Self {
            method,
            tiers: Vec::new(),
        }
    }

    pub fn tiered(tiers: Vec<Tier>) -> Self {
        Self {
            method: RuleMethod::TieredKwp,
            tiers,
        }
    }
}

/// One row of the energy/gas margin table, expressed at the 301-600 MWh tier.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnergyMarginBand {
    #[serde(deserialize_with = "lenient_number")]
    pub margin_min: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub ponderador: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub valor: f64,
}

/// Factors deriving the low and high volume tiers from the reference band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeMultipliers {
    #[serde(deserialize_with = "lenient_number")]
    pub low: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub high: f64,
}

impl Default for VolumeMultipliers {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW_VOLUME_MULTIPLIER,
            high: DEFAULT_HIGH_VOLUME_MULTIPLIER,
        }
    }
}

impl VolumeMultipliers {
    pub fn effective_low(&self) -> f64 {
        usable_multiplier(self.low, DEFAULT_LOW_VOLUME_MULTIPLIER)
    }

    pub fn effective_high(&self) -> f64 {
        usable_multiplier(self.high, DEFAULT_HIGH_VOLUME_MULTIPLIER)
    }
}

fn usable_multiplier(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnergyCommissionConfig {
    pub bands: Vec<EnergyMarginBand>,
    pub volume_multipliers: VolumeMultipliers,
}

/// Annual consumption classification used by the energy method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeTier {
    Low,
    Reference,
    High,
}

impl VolumeTier {
    pub const LOW_MAX_MWH: f64 = 300.0;
    pub const REFERENCE_MAX_MWH: f64 = 600.0;

    pub fn classify(annual_volume_mwh: f64) -> Self {
        if !annual_volume_mwh.is_finite() || annual_volume_mwh <= Self::LOW_MAX_MWH {
            VolumeTier::Low
        } else if annual_volume_mwh <= Self::REFERENCE_MAX_MWH {
            VolumeTier::Reference
        } else {
            VolumeTier::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VolumeTier::Low => "0-300 MWh",
            VolumeTier::Reference => "301-600 MWh",
            VolumeTier::High => "601+ MWh",
        }
    }
}

/// Facts of a sale or proposal fed to the generic methods.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DealFacts {
    pub kwp: f64,
    pub value: f64,
    pub contract_model: ContractModel,
}

/// Facts of an energy/gas supply deal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnergyFacts {
    pub margin: f64,
    pub annual_volume_mwh: f64,
}

/// Computed commission plus the audit note describing how it was reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionQuote {
    pub product: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_model: Option<ContractModel>,
    pub amount: f64,
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rule_serializes_with_method_tag_and_camel_case_fields() {
        let rule = CommissionRule::new(RuleMethod::FormulaPercentage(FormulaPercentage {
            factor: 2.0,
            divisor: 1000.0,
            pct_transaccional: 5.0,
            pct_aas: 6.0,
        }));
        let value = serde_json::to_value(&rule).expect("serializes");
        assert_eq!(
            value,
            json!({
                "method": "formula_percentage",
                "factor": 2.0,
                "divisor": 1000.0,
                "pctTransaccional": 5.0,
                "pctAas": 6.0,
                "tiers": [],
            })
        );
    }

    #[test]
    fn rule_deserializes_missing_coefficients_as_zero() {
        let rule: CommissionRule =
            serde_json::from_value(json!({ "method": "percentage_valor", "pctAas": 3 }))
                .expect("deserializes");
        assert_eq!(
            rule.method,
            RuleMethod::PercentageValor(PercentageValor {
                pct_transaccional: 0.0,
                pct_aas: 3.0,
            })
        );
        assert!(rule.tiers.is_empty());
    }

    #[test]
    fn coefficients_read_nulls_and_numeric_strings() {
        let tier: Tier = serde_json::from_value(json!({
            "kwpMin": "10",
            "kwpMax": "50,5",
            "baseTransaccional": null,
            "adicTransaccional": true,
            "baseAas": 200,
        }))
        .expect("deserializes");
        assert_eq!(tier.kwp_min, 10.0);
        assert_eq!(tier.kwp_max, 50.5);
        assert_eq!(tier.base_transaccional, 0.0);
        assert_eq!(tier.adic_transaccional, 0.0);
        assert_eq!(tier.base_aas, 200.0);
        assert_eq!(tier.adic_aas, 0.0);
    }

    #[test]
    fn zeroed_methods_match_known_names() {
        for name in RuleMethod::NAMES {
            let method = RuleMethod::zeroed(name).expect("known name");
            assert_eq!(method.name(), name);
        }
        assert_eq!(RuleMethod::zeroed("escalado"), None);
    }

    #[test]
    fn multipliers_fall_back_when_unusable() {
        let multipliers = VolumeMultipliers {
            low: 0.0,
            high: f64::NAN,
        };
        assert_eq!(multipliers.effective_low(), DEFAULT_LOW_VOLUME_MULTIPLIER);
        assert_eq!(multipliers.effective_high(), DEFAULT_HIGH_VOLUME_MULTIPLIER);

        let config: EnergyCommissionConfig =
            serde_json::from_value(json!({ "bands": [] })).expect("deserializes");
        assert_eq!(config.volume_multipliers, VolumeMultipliers::default());
    }

    #[test]
    fn volume_tier_boundaries() {
        assert_eq!(VolumeTier::classify(0.0), VolumeTier::Low);
        assert_eq!(VolumeTier::classify(300.0), VolumeTier::Low);
        assert_eq!(VolumeTier::classify(300.5), VolumeTier::Reference);
        assert_eq!(VolumeTier::classify(600.0), VolumeTier::Reference);
        assert_eq!(VolumeTier::classify(601.0), VolumeTier::High);
        assert_eq!(VolumeTier::classify(-5.0), VolumeTier::Low);
    }
}
