use super::normalizer::normalize_header;
use crate::commission::domain::Tier;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Canonical tier columns a spreadsheet header can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierField {
    KwpMin,
    KwpMax,
    BaseTransaccional,
    AdicTransaccional,
    BaseAas,
    AdicAas,
}

impl TierField {
    pub const ALL: [TierField; 6] = [
        TierField::KwpMin,
        TierField::KwpMax,
        TierField::BaseTransaccional,
        TierField::AdicTransaccional,
        TierField::BaseAas,
        TierField::AdicAas,
    ];

    pub fn canonical_name(&self) -> &'static str {
        match self {
            TierField::KwpMin => "kwpMin",
            TierField::KwpMax => "kwpMax",
            TierField::BaseTransaccional => "baseTransaccional",
            TierField::AdicTransaccional => "adicTransaccional",
            TierField::BaseAas => "baseAas",
            TierField::AdicAas => "adicAas",
        }
    }

    /// Header text shown to users when no column could be recognized.
    pub fn display_header(&self) -> &'static str {
        match self {
            TierField::KwpMin => "kWp Min",
            TierField::KwpMax => "kWp Max",
            TierField::BaseTransaccional => "Base Trans.",
            TierField::AdicTransaccional => "Adic. Trans.",
            TierField::BaseAas => "Base AAS",
            TierField::AdicAas => "Adic. AAS",
        }
    }

    pub(crate) fn assign(&self, tier: &mut Tier, value: f64) {
        match self {
            TierField::KwpMin => tier.kwp_min = value,
            TierField::KwpMax => tier.kwp_max = value,
            TierField::BaseTransaccional => tier.base_transaccional = value,
            TierField::AdicTransaccional => tier.adic_transaccional = value,
            TierField::BaseAas => tier.base_aas = value,
            TierField::AdicAas => tier.adic_aas = value,
        }
    }
}

static TIER_HEADER_MAP: OnceLock<HashMap<String, TierField>> = OnceLock::new();

pub(crate) fn tier_field_for_header(header: &str) -> Option<TierField> {
    tier_header_map().get(&normalize_header(header)).copied()
}

pub(crate) fn expected_tier_headers() -> Vec<String> {
    TierField::ALL
        .iter()
        .map(|field| field.display_header().to_string())
        .collect()
}

fn tier_header_map() -> &'static HashMap<String, TierField> {
    TIER_HEADER_MAP.get_or_init(|| {
        const ALIASES: &[(&str, TierField)] = &[
            ("kWp Min", TierField::KwpMin),
            ("kWp Mín", TierField::KwpMin),
            ("Min kWp", TierField::KwpMin),
            ("kWp Desde", TierField::KwpMin),
            ("Desde", TierField::KwpMin),
            ("kWp Max", TierField::KwpMax),
            ("kWp Máx", TierField::KwpMax),
            ("Max kWp", TierField::KwpMax),
            ("kWp Hasta", TierField::KwpMax),
            ("Hasta", TierField::KwpMax),
            ("Base Trans.", TierField::BaseTransaccional),
            ("Base Transaccional", TierField::BaseTransaccional),
            ("Base Transactional", TierField::BaseTransaccional),
            ("Adic. Trans.", TierField::AdicTransaccional),
            ("Adic Transaccional", TierField::AdicTransaccional),
            ("Adicional Trans.", TierField::AdicTransaccional),
            ("Adicional Transaccional", TierField::AdicTransaccional),
            ("Adic. Transactional", TierField::AdicTransaccional),
            ("Base AAS", TierField::BaseAas),
            ("Base SaaS", TierField::BaseAas),
            ("Adic. AAS", TierField::AdicAas),
            ("Adicional AAS", TierField::AdicAas),
            ("Adic. SaaS", TierField::AdicAas),
        ];

        let mut map = HashMap::with_capacity(ALIASES.len() + TierField::ALL.len());
        for (alias, field) in ALIASES {
            map.insert(normalize_header(alias), *field);
        }
        for field in TierField::ALL {
            map.insert(normalize_header(field.canonical_name()), field);
        }
        map
    })
}
