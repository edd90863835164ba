use super::domain::{
    CommissionQuote, CommissionRule, DealFacts, EnergyCommissionConfig, EnergyFacts,
    ENERGY_RULE_KEY,
};
use super::import::{self, ImportError, SheetTable};
use super::migration::migrate_matrix;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-organization commission configuration.
///
/// Serialized as one flat object keyed by product name, with the energy/gas
/// configuration under the reserved `ee_gas` key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommissionMatrix {
    pub rules: BTreeMap<String, CommissionRule>,
    pub energy: EnergyCommissionConfig,
}

impl CommissionMatrix {
    pub fn rule(&self, product: &str) -> Option<&CommissionRule> {
        self.rules.get(product)
    }

    pub fn set_rule(&mut self, product: impl Into<String>, rule: CommissionRule) {
        self.rules.insert(product.into(), rule);
    }

    pub fn quote(&self, product: &str, facts: &DealFacts) -> Option<CommissionQuote> {
        self.rule(product).map(|rule| rule.quote(product, facts))
    }

    pub fn quote_energy(&self, facts: &EnergyFacts) -> CommissionQuote {
        self.energy.quote(facts)
    }

    /// Appends tiers parsed from `table` to the product's rule, creating the
    /// default rule when the product has none. Returns the number of rows added.
    pub fn import_tiers(&mut self, product: &str, table: &SheetTable) -> Result<usize, ImportError> {
        let tiers = import::parse_tiers(table)?;
        let added = tiers.len();
        self.rules
            .entry(product.to_string())
            .or_default()
            .tiers
            .extend(tiers);
        Ok(added)
    }

    pub fn import_bands(&mut self, table: &SheetTable) -> Result<usize, ImportError> {
        let bands = import::parse_bands(table)?;
        let added = bands.len();
        self.energy.bands.extend(bands);
        Ok(added)
    }

    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl Serialize for CommissionMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let products = self
            .rules
            .iter()
            .filter(|(product, _)| product.as_str() != ENERGY_RULE_KEY);
        let mut map = serializer.serialize_map(None)?;
        for (product, rule) in products {
            map.serialize_entry(product, rule)?;
        }
        map.serialize_entry(ENERGY_RULE_KEY, &self.energy)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for CommissionMatrix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(migrate_matrix(Some(&raw), &[]))
    }
}
