use crate::error::{AdvisorError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A balance band covering (lower, upper].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TierBand {
    #[schemars(description = "Display name of the tier, e.g. 'Tier 1'")]
    pub name: String,
    #[schemars(description = "Exclusive lower bound of the band in SGD")]
    pub lower: f64,
    #[schemars(description = "Inclusive upper bound (cap) of the band in SGD")]
    pub upper: f64,
}

impl TierBand {
    pub fn new(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
        }
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Portion of `balance` that falls inside this band.
    pub fn portion_of(&self, balance: f64) -> f64 {
        (balance.min(self.upper) - self.lower).max(0.0)
    }
}

/// Ordered, contiguous set of bands starting at zero. Bonus is progressive:
/// each band's rate only applies to the slice of the balance inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TierSchedule {
    bands: Vec<TierBand>,
}

impl TierSchedule {
    pub fn new(bands: Vec<TierBand>) -> Result<Self> {
        let schedule = Self { bands };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Builds bands named "Tier 1".."Tier N" from their caps.
    pub fn from_caps(caps: &[f64]) -> Result<Self> {
        let schedule = Self::from_caps_unchecked(caps);
        schedule.validate()?;
        Ok(schedule)
    }

    /// For the built-in product tables, whose caps are known to be valid.
    pub(crate) fn from_caps_unchecked(caps: &[f64]) -> Self {
        let mut lower = 0.0;
        let mut bands = Vec::with_capacity(caps.len());
        for (idx, cap) in caps.iter().enumerate() {
            bands.push(TierBand::new(format!("Tier {}", idx + 1), lower, *cap));
            lower = *cap;
        }
        Self { bands }
    }

    pub fn validate(&self) -> Result<()> {
        if self.bands.is_empty() {
            return Err(AdvisorError::InvalidTierSchedule(
                "Schedule must contain at least one band".to_string(),
            ));
        }

        let mut expected_lower = 0.0;
        for band in &self.bands {
            if !band.lower.is_finite() || !band.upper.is_finite() {
                return Err(AdvisorError::InvalidTierSchedule(format!(
                    "{} has a non-finite bound",
                    band.name
                )));
            }
            if (band.lower - expected_lower).abs() > f64::EPSILON {
                return Err(AdvisorError::InvalidTierSchedule(format!(
                    "{} starts at {} but the previous band ends at {}",
                    band.name, band.lower, expected_lower
                )));
            }
            if band.upper <= band.lower {
                return Err(AdvisorError::InvalidTierSchedule(format!(
                    "{} cap {} must be above its lower bound {}",
                    band.name, band.upper, band.lower
                )));
            }
            expected_lower = band.upper;
        }

        Ok(())
    }

    pub fn bands(&self) -> &[TierBand] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Highest cap in the schedule. Balance above it earns no bonus.
    pub fn ceiling(&self) -> f64 {
        self.bands.last().map(|b| b.upper).unwrap_or(0.0)
    }

    /// Splits a balance across the bands, in band order.
    pub fn split(&self, balance: f64) -> Vec<f64> {
        self.bands.iter().map(|b| b.portion_of(balance)).collect()
    }

    /// Index of the band the balance sits in. Zero maps to the first band,
    /// anything past the ceiling to the last.
    pub fn tier_index_for(&self, balance: f64) -> usize {
        self.bands
            .iter()
            .position(|b| balance <= b.upper)
            .unwrap_or_else(|| self.bands.len().saturating_sub(1))
    }

    pub fn tier_for(&self, balance: f64) -> &TierBand {
        &self.bands[self.tier_index_for(balance)]
    }

    pub fn cap_of(&self, tier_index: usize) -> Option<f64> {
        self.bands.get(tier_index).map(|b| b.upper)
    }

    pub fn next_tier(&self, tier_index: usize) -> Option<&TierBand> {
        self.bands.get(tier_index + 1)
    }

    pub fn is_last(&self, tier_index: usize) -> bool {
        tier_index + 1 >= self.bands.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_account_tiers() -> TierSchedule {
        TierSchedule::from_caps(&[75_000.0, 125_000.0, 150_000.0]).unwrap()
    }

    #[test]
    fn test_split_is_progressive() {
        let tiers = one_account_tiers();
        assert_eq!(tiers.split(50_000.0), vec![50_000.0, 0.0, 0.0]);
        assert_eq!(tiers.split(127_000.0), vec![75_000.0, 50_000.0, 2_000.0]);
        assert_eq!(tiers.split(200_000.0), vec![75_000.0, 50_000.0, 25_000.0]);
        assert_eq!(tiers.split(0.0), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_tier_for_boundaries() {
        let tiers = one_account_tiers();
        assert_eq!(tiers.tier_for(0.0).name, "Tier 1");
        assert_eq!(tiers.tier_for(75_000.0).name, "Tier 1");
        assert_eq!(tiers.tier_for(75_000.01).name, "Tier 2");
        assert_eq!(tiers.tier_for(125_000.0).name, "Tier 2");
        assert_eq!(tiers.tier_for(150_000.0).name, "Tier 3");
        assert_eq!(tiers.tier_for(1_000_000.0).name, "Tier 3");
    }

    #[test]
    fn test_navigation() {
        let tiers = one_account_tiers();
        assert_eq!(tiers.cap_of(0), Some(75_000.0));
        assert_eq!(tiers.next_tier(0).map(|b| b.upper), Some(125_000.0));
        assert!(tiers.next_tier(2).is_none());
        assert!(tiers.is_last(2));
        assert_eq!(tiers.ceiling(), 150_000.0);
    }

    #[test]
    fn test_rejects_gaps_and_inversions() {
        assert!(TierSchedule::new(vec![]).is_err());

        let gap = TierSchedule::new(vec![
            TierBand::new("Tier 1", 0.0, 10_000.0),
            TierBand::new("Tier 2", 20_000.0, 40_000.0),
        ]);
        assert!(gap.is_err());

        let inverted = TierSchedule::from_caps(&[10_000.0, 5_000.0]);
        assert!(inverted.is_err());
    }
}
