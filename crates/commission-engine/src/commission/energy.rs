//! Margin-band evaluation for energy/gas supply deals.

use super::domain::{
    CommissionQuote, EnergyCommissionConfig, EnergyFacts, EnergyMarginBand, VolumeTier,
    ENERGY_RULE_KEY,
};
use super::evaluator::finite_or_zero;

/// Band coefficients after applying the volume-tier multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustedBand {
    pub margin_min: f64,
    pub ponderador: f64,
    pub valor: f64,
    pub volume_tier: VolumeTier,
}

impl EnergyCommissionConfig {
    pub fn evaluate(&self, facts: &EnergyFacts) -> f64 {
        self.quote(facts).amount
    }

    pub fn quote(&self, facts: &EnergyFacts) -> CommissionQuote {
        let volume_tier = VolumeTier::classify(facts.annual_volume_mwh);
        let (amount, notes) = match self.adjusted_band(facts.margin, volume_tier) {
            Some(band) => {
                let amount = band.valor + (facts.margin - band.margin_min) * (band.ponderador / 100.0);
                let notes = format!(
                    "band from margin {} at {}: {} + ({} - {}) x {}%",
                    band.margin_min,
                    volume_tier.label(),
                    band.valor,
                    facts.margin,
                    band.margin_min,
                    band.ponderador
                );
                (amount, notes)
            }
            None if self.bands.is_empty() => (0.0, "no margin bands configured".to_string()),
            None => (
                0.0,
                format!("margin {} below every configured band", facts.margin),
            ),
        };

        CommissionQuote {
            product: ENERGY_RULE_KEY.to_string(),
            method: "energy_margin_band".to_string(),
            contract_model: None,
            amount: finite_or_zero(amount),
            notes,
        }
    }

    /// Floor lookup of the band for `margin`, scaled to `volume_tier`.
    pub fn adjusted_band(&self, margin: f64, volume_tier: VolumeTier) -> Option<AdjustedBand> {
        let band = floor_band(&self.bands, margin)?;
        let (ponderador, valor) = match volume_tier {
            VolumeTier::Low => {
                let divisor = self.volume_multipliers.effective_low();
                (band.ponderador / divisor, band.valor / divisor)
            }
            VolumeTier::Reference => (band.ponderador, band.valor),
            VolumeTier::High => {
                let multiplier = self.volume_multipliers.effective_high();
                (band.ponderador * multiplier, band.valor * multiplier)
            }
        };

        Some(AdjustedBand {
            margin_min: band.margin_min,
            ponderador,
            valor,
            volume_tier,
        })
    }
}

/// Band with the greatest `margin_min` not above `margin`. Bands are sorted on a
/// copy, so callers may store them in any order.
pub fn floor_band(bands: &[EnergyMarginBand], margin: f64) -> Option<EnergyMarginBand> {
    if !margin.is_finite() {
        return None;
    }

    let mut sorted: Vec<EnergyMarginBand> = bands
        .iter()
        .filter(|band| band.margin_min.is_finite())
        .copied()
        .collect();
    sorted.sort_by(|a, b| a.margin_min.total_cmp(&b.margin_min));

    sorted
        .into_iter()
        .take_while(|band| band.margin_min <= margin)
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commission::domain::VolumeMultipliers;

    fn band(margin_min: f64, ponderador: f64, valor: f64) -> EnergyMarginBand {
        EnergyMarginBand {
            margin_min,
            ponderador,
            valor,
        }
    }

    fn config() -> EnergyCommissionConfig {
        EnergyCommissionConfig {
            bands: vec![
                band(-5.0, 1.0, 10.0),
                band(0.0, 4.0, 100.0),
                band(10.0, 6.0, 250.0),
            ],
            volume_multipliers: VolumeMultipliers::default(),
        }
    }

    fn facts(margin: f64, annual_volume_mwh: f64) -> EnergyFacts {
        EnergyFacts {
            margin,
            annual_volume_mwh,
        }
    }

    #[test]
    fn margin_at_band_minimum_yields_flat_value() {
        let amount = config().evaluate(&facts(10.0, 450.0));
        assert_eq!(amount, 250.0);
    }

    #[test]
    fn reference_tier_adds_linear_adjustment() {
        let amount = config().evaluate(&facts(5.0, 450.0));
        assert!((amount - (100.0 + 5.0 * 0.04)).abs() < 1e-9);
    }

    #[test]
    fn low_tier_divides_by_low_multiplier() {
        let adjusted = config()
            .adjusted_band(0.0, VolumeTier::Low)
            .expect("band found");
        assert!((adjusted.ponderador - 3.008).abs() < 1e-3);
        assert!((adjusted.valor - 100.0 / 1.33).abs() < 1e-9);
    }

    #[test]
    fn high_tier_multiplies_by_high_multiplier() {
        let adjusted = config()
            .adjusted_band(3.0, VolumeTier::High)
            .expect("band found");
        assert_eq!(adjusted.ponderador, 6.0);
        assert_eq!(adjusted.valor, 150.0);

        let amount = config().evaluate(&facts(3.0, 1_200.0));
        assert!((amount - (150.0 + 3.0 * 0.06)).abs() < 1e-9);
    }

    #[test]
    fn negative_margins_use_below_zero_band() {
        let amount = config().evaluate(&facts(-2.0, 450.0));
        assert!((amount - (10.0 + 3.0 * 0.01)).abs() < 1e-9);
    }

    #[test]
    fn margin_below_all_bands_and_empty_bands_yield_zero() {
        assert_eq!(config().evaluate(&facts(-10.0, 450.0)), 0.0);
        let quote = EnergyCommissionConfig::default().quote(&facts(4.0, 100.0));
        assert_eq!(quote.amount, 0.0);
        assert!(quote.notes.contains("no margin bands"));
    }

    #[test]
    fn floor_lookup_sorts_unordered_bands() {
        let bands = vec![band(10.0, 6.0, 250.0), band(-5.0, 1.0, 10.0), band(0.0, 4.0, 100.0)];
        let found = floor_band(&bands, 7.0).expect("band found");
        assert_eq!(found.margin_min, 0.0);
    }

    #[test]
    fn zero_multiplier_does_not_divide_by_zero() {
        let mut config = config();
        config.volume_multipliers = VolumeMultipliers { low: 0.0, high: 0.0 };
        let amount = config.evaluate(&facts(0.0, 50.0));
        assert!((amount - 100.0 / 1.33).abs() < 1e-9);
    }
}
