use crate::banding::TierSchedule;
use crate::error::{AdvisorError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, JsonSchema)]
pub enum Level {
    #[schemars(description = "Card spend below the minimum; only base interest applies")]
    #[serde(rename = "None")]
    Unqualified,
    #[serde(rename = "Level 1")]
    Level1,
    #[serde(rename = "Level 2")]
    Level2,
    #[serde(rename = "Level 3")]
    Level3,
}

impl Level {
    pub fn next(self) -> Option<Level> {
        match self {
            Level::Unqualified => Some(Level::Level1),
            Level::Level1 => Some(Level::Level2),
            Level::Level2 => Some(Level::Level3),
            Level::Level3 => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Level::Unqualified => "None",
            Level::Level1 => "Level 1",
            Level::Level2 => "Level 2",
            Level::Level3 => "Level 3",
        };
        f.write_str(label)
    }
}

/// Rates are annual percentages, e.g. 1.45 for 1.45% p.a.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OneAccountRules {
    pub card_spend_threshold: f64,
    pub giro_count_threshold: u32,
    pub salary_credit_threshold: f64,
    pub tiers: TierSchedule,
    pub base_rate_pct: f64,
    pub level_1_bonus_pct: Vec<f64>,
    pub level_2_bonus_pct: Vec<f64>,
    pub level_3_bonus_pct: Vec<f64>,
}

impl Default for OneAccountRules {
    fn default() -> Self {
        Self {
            card_spend_threshold: 500.0,
            giro_count_threshold: 3,
            salary_credit_threshold: 1_600.0,
            tiers: TierSchedule::from_caps_unchecked(&[75_000.0, 125_000.0, 150_000.0]),
            base_rate_pct: 0.05,
            level_1_bonus_pct: vec![0.60, 0.00, 0.00],
            level_2_bonus_pct: vec![0.95, 1.95, 0.00],
            level_3_bonus_pct: vec![1.45, 2.95, 4.45],
        }
    }
}

impl OneAccountRules {
    /// Card spend gates every level. Salary credit lifts straight to Level 3
    /// without GIRO; otherwise enough GIRO debits give Level 2.
    pub fn qualify(&self, card_spend: f64, salary_credit: f64, giro_count: u32) -> Level {
        if card_spend < self.card_spend_threshold {
            Level::Unqualified
        } else if salary_credit >= self.salary_credit_threshold {
            Level::Level3
        } else if giro_count >= self.giro_count_threshold {
            Level::Level2
        } else {
            Level::Level1
        }
    }

    /// Per-tier bonus rates for a level. `Unqualified` earns no bonus.
    pub fn bonus_rates(&self, level: Level) -> Vec<f64> {
        match level {
            Level::Unqualified => vec![0.0; self.tiers.len()],
            Level::Level1 => self.level_1_bonus_pct.clone(),
            Level::Level2 => self.level_2_bonus_pct.clone(),
            Level::Level3 => self.level_3_bonus_pct.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.tiers.validate()?;
        validate_rate(self.base_rate_pct, "Base rate")?;
        for (label, rates) in [
            ("Level 1", &self.level_1_bonus_pct),
            ("Level 2", &self.level_2_bonus_pct),
            ("Level 3", &self.level_3_bonus_pct),
        ] {
            validate_rate_row(label, rates, self.tiers.len())?;
        }
        if self.card_spend_threshold < 0.0 || self.salary_credit_threshold < 0.0 {
            return Err(AdvisorError::InvalidRateTable(
                "Qualification thresholds cannot be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Human-readable rule table, used as model context.
    pub fn describe(&self) -> serde_json::Value {
        let pct = |r: f64| format!("{:.2}%", r);
        let row = |rates: &[f64]| {
            self.tiers
                .bands()
                .iter()
                .zip(rates)
                .map(|(band, rate)| (band.name.clone(), serde_json::Value::String(pct(*rate))))
                .collect::<serde_json::Map<_, _>>()
        };

        serde_json::json!({
            "levels": {
                "level_1": format!("Card spend >= S${:.0}", self.card_spend_threshold),
                "level_2": format!(
                    "Card spend >= S${:.0} & Perform {} GIRO debit transactions",
                    self.card_spend_threshold, self.giro_count_threshold
                ),
                "level_3": format!(
                    "Card spend >= S${:.0} & Credit salary of minimum S${:.0} (GIRO not required)",
                    self.card_spend_threshold, self.salary_credit_threshold
                ),
            },
            "tiers": describe_tiers(&self.tiers),
            "interest_rates": {
                "Base Rate": pct(self.base_rate_pct),
                "Level 1 Bonus": row(&self.level_1_bonus_pct),
                "Level 2 Bonus": row(&self.level_2_bonus_pct),
                "Level 3 Bonus": row(&self.level_3_bonus_pct),
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StashRules {
    pub tiers: TierSchedule,
    pub base_rate_pct: f64,
    pub bonus_pct: Vec<f64>,
}

impl Default for StashRules {
    fn default() -> Self {
        Self {
            tiers: TierSchedule::from_caps_unchecked(&[10_000.0, 40_000.0, 70_000.0, 100_000.0]),
            base_rate_pct: 0.05,
            bonus_pct: vec![0.00, 1.55, 2.15, 2.90],
        }
    }
}

impl StashRules {
    /// Bonus needs this month's average balance to hold or grow.
    pub fn is_bonus_eligible(&self, last_month: f64, this_month: f64) -> bool {
        this_month >= last_month
    }

    pub fn validate(&self) -> Result<()> {
        self.tiers.validate()?;
        validate_rate(self.base_rate_pct, "Base rate")?;
        validate_rate_row("Bonus", &self.bonus_pct, self.tiers.len())
    }

    pub fn describe(&self) -> serde_json::Value {
        let rates = self
            .tiers
            .bands()
            .iter()
            .zip(&self.bonus_pct)
            .map(|(band, rate)| (band.name.clone(), serde_json::Value::String(format!("{:.2}%", rate))))
            .collect::<serde_json::Map<_, _>>();

        serde_json::json!({
            "criteria": "Maintain or increase your monthly average balance as compared to the previous month to qualify for bonus interest rate",
            "tiers": describe_tiers(&self.tiers),
            "interest_rates": {
                "Base Rate": format!("{:.2}%", self.base_rate_pct),
                "Bonus Rate": rates,
            }
        })
    }
}

fn describe_tiers(tiers: &TierSchedule) -> serde_json::Value {
    tiers
        .bands()
        .iter()
        .enumerate()
        .map(|(idx, band)| {
            let text = if idx == 0 {
                format!("Bonus interest applies on first S${:.0}", band.upper)
            } else {
                format!(
                    "Bonus interest applies on next S${:.0} (from >S${:.0} to S${:.0})",
                    band.width(),
                    band.lower,
                    band.upper
                )
            };
            (format!("tier_{}", idx + 1), serde_json::Value::String(text))
        })
        .collect::<serde_json::Map<_, _>>()
        .into()
}

fn validate_rate(rate: f64, label: &str) -> Result<()> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(AdvisorError::InvalidRateTable(format!(
            "{} must be a non-negative percentage, got {}",
            label, rate
        )));
    }
    Ok(())
}

fn validate_rate_row(label: &str, rates: &[f64], tier_count: usize) -> Result<()> {
    if rates.len() != tier_count {
        return Err(AdvisorError::InvalidRateTable(format!(
            "{} has {} rates but there are {} tiers",
            label,
            rates.len(),
            tier_count
        )));
    }
    for rate in rates {
        validate_rate(*rate, label)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_qualification() {
        let rules = OneAccountRules::default();
        assert_eq!(rules.qualify(400.0, 5_000.0, 5), Level::Unqualified);
        assert_eq!(rules.qualify(500.0, 0.0, 0), Level::Level1);
        assert_eq!(rules.qualify(700.0, 1_400.0, 2), Level::Level1);
        assert_eq!(rules.qualify(700.0, 1_400.0, 3), Level::Level2);
        assert_eq!(rules.qualify(700.0, 1_600.0, 0), Level::Level3);
        assert_eq!(rules.qualify(700.0, 2_000.0, 3), Level::Level3);
    }

    #[test]
    fn test_level_progression() {
        assert_eq!(Level::Unqualified.next(), Some(Level::Level1));
        assert_eq!(Level::Level2.next(), Some(Level::Level3));
        assert_eq!(Level::Level3.next(), None);
        assert!(Level::Level3 > Level::Level1);
        assert_eq!(Level::Level2.to_string(), "Level 2");
        assert_eq!(serde_json::to_string(&Level::Level1).unwrap(), "\"Level 1\"");
    }

    #[test]
    fn test_defaults_validate() {
        assert!(OneAccountRules::default().validate().is_ok());
        assert!(StashRules::default().validate().is_ok());
    }

    #[test]
    fn test_rate_row_length_mismatch() {
        let rules = OneAccountRules {
            level_2_bonus_pct: vec![0.95, 1.95],
            ..OneAccountRules::default()
        };
        assert!(matches!(
            rules.validate(),
            Err(AdvisorError::InvalidRateTable(_))
        ));

        let stash = StashRules {
            bonus_pct: vec![0.0, -1.0, 2.15, 2.90],
            ..StashRules::default()
        };
        assert!(stash.validate().is_err());
    }

    #[test]
    fn test_unqualified_has_no_bonus() {
        let rules = OneAccountRules::default();
        assert_eq!(rules.bonus_rates(Level::Unqualified), vec![0.0, 0.0, 0.0]);
        assert_eq!(rules.bonus_rates(Level::Level3), vec![1.45, 2.95, 4.45]);
    }

    #[test]
    fn test_describe_mentions_thresholds() {
        let text = OneAccountRules::default().describe().to_string();
        assert!(text.contains("Card spend >= S$500"));
        assert!(text.contains("from >S$75000 to S$125000"));
        assert!(text.contains("4.45%"));

        let stash = StashRules::default().describe().to_string();
        assert!(stash.contains("Bonus interest applies on first S$10000"));
        assert!(stash.contains("2.90%"));
    }

    #[test]
    fn test_stash_eligibility() {
        let rules = StashRules::default();
        assert!(rules.is_bonus_eligible(50_000.0, 50_000.0));
        assert!(rules.is_bonus_eligible(50_000.0, 60_000.0));
        assert!(!rules.is_bonus_eligible(51_000.0, 49_000.0));
    }
}
