use crate::products::Level;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Product {
    #[schemars(description = "Tiered current account; bonus depends on level and balance tier")]
    OneAccount,
    #[schemars(description = "Tiered savings account; bonus requires the balance to hold or grow")]
    StashAccount,
}

impl Product {
    pub fn file_stem(self) -> &'static str {
        match self {
            Product::OneAccount => "one_account",
            Product::StashAccount => "stash",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Product::OneAccount => f.write_str("One Account"),
            Product::StashAccount => f.write_str("Stash Account"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneAccountCustomer {
    pub customer_id: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub snap_date: NaiveDate,
    pub avg_balance: f64,
    pub salary_credit: f64,
    pub card_spend: f64,
    pub giro_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StashCustomer {
    pub customer_id: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub snap_date: NaiveDate,
    pub average_balance_last_month: f64,
    pub average_balance_this_month: f64,
}

/// Either product's customer record, so a batch can carry both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "product", rename_all = "snake_case")]
pub enum CustomerRecord {
    OneAccount(OneAccountCustomer),
    StashAccount(StashCustomer),
}

impl CustomerRecord {
    pub fn customer_id(&self) -> &str {
        match self {
            CustomerRecord::OneAccount(c) => &c.customer_id,
            CustomerRecord::StashAccount(c) => &c.customer_id,
        }
    }

    pub fn customer_name(&self) -> Option<&str> {
        match self {
            CustomerRecord::OneAccount(c) => c.customer_name.as_deref(),
            CustomerRecord::StashAccount(c) => c.customer_name.as_deref(),
        }
    }

    pub fn snap_date(&self) -> NaiveDate {
        match self {
            CustomerRecord::OneAccount(c) => c.snap_date,
            CustomerRecord::StashAccount(c) => c.snap_date,
        }
    }

    pub fn product(&self) -> Product {
        match self {
            CustomerRecord::OneAccount(_) => Product::OneAccount,
            CustomerRecord::StashAccount(_) => Product::StashAccount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TierInterest {
    #[schemars(description = "Tier name, e.g. 'Tier 2'")]
    pub tier: String,
    #[schemars(description = "Portion of the balance that falls inside this tier")]
    pub balance_in_tier: f64,
    #[schemars(description = "Annual bonus rate for this tier, in percent")]
    pub rate_pct: f64,
    #[schemars(description = "Monthly bonus interest on this tier, rounded down to cents")]
    pub interest: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InterestBreakdown {
    pub base_interest_month: f64,
    pub tiers: Vec<TierInterest>,
    pub bonus_interest_month: f64,
    pub total_interest_month: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CurrentSnapshot {
    #[schemars(description = "Average balance used for the calculation (this month's for Stash)")]
    pub avg_balance: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Previous month's average balance (Stash only)")]
    pub average_balance_last_month: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Qualified level (One Account only)")]
    pub level: Option<Level>,

    pub tier: String,
    pub days_in_month: u32,
    pub days_in_year: u32,

    #[schemars(description = "Whether bonus interest applies this month")]
    pub bonus_eligible: bool,

    pub interest: InterestBreakdown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub enum ScenarioKind {
    #[serde(rename = "Upgrade Level")]
    UpgradeLevel,
    #[serde(rename = "Qualify for Bonus")]
    QualifyForBonus,
    #[serde(rename = "Top-up to Tier Cap")]
    TopUpToTierCap,
    #[serde(rename = "Upgrade Tier")]
    UpgradeTier,
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScenarioKind::UpgradeLevel => "Upgrade Level",
            ScenarioKind::QualifyForBonus => "Qualify for Bonus",
            ScenarioKind::TopUpToTierCap => "Top-up to Tier Cap",
            ScenarioKind::UpgradeTier => "Upgrade Tier",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Simulation {
    pub name: ScenarioKind,
    pub assumption: String,

    #[schemars(description = "False when the scenario cannot improve on the current position (e.g. already Level 3)")]
    pub applicable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_level: Option<Level>,

    pub new_tier: String,
    pub new_avg_balance: f64,

    #[schemars(description = "Additional deposit needed to reach new_avg_balance")]
    pub top_up_amount: f64,

    pub interest: InterestBreakdown,
    pub incremental_gain_vs_current: f64,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RecommendedAction {
    #[schemars(description = "First scenario by priority with a positive gain, or null if none")]
    pub chosen_scenario: Option<ScenarioKind>,
    pub reasoning: String,
    pub recommended_incremental_gain_vs_current: f64,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InterestReport {
    pub product: Product,
    pub customer_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,

    #[schemars(description = "Snapshot date in YYYY-MM-DD format")]
    pub snap_date: NaiveDate,

    pub current: CurrentSnapshot,

    #[schemars(description = "Scenarios in priority order")]
    pub simulations: Vec<Simulation>,

    pub recommended_action: RecommendedAction,
}

impl InterestReport {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(InterestReport)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }

    pub fn chosen_simulation(&self) -> Option<&Simulation> {
        let kind = self.recommended_action.chosen_scenario?;
        self.simulations.iter().find(|s| s.name == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = InterestReport::schema_as_json().unwrap();
        assert!(schema_json.contains("snap_date"));
        assert!(schema_json.contains("simulations"));
        assert!(schema_json.contains("recommended_incremental_gain_vs_current"));
        assert!(schema_json.contains("Top-up to Tier Cap"));
    }

    #[test]
    fn test_customer_record_accessors() {
        let record = CustomerRecord::StashAccount(StashCustomer {
            customer_id: "S001".to_string(),
            customer_name: Some("Tan Mei Ling".to_string()),
            snap_date: NaiveDate::from_ymd_opt(2025, 8, 31).unwrap(),
            average_balance_last_month: 51_000.0,
            average_balance_this_month: 49_000.0,
        });

        assert_eq!(record.customer_id(), "S001");
        assert_eq!(record.customer_name(), Some("Tan Mei Ling"));
        assert_eq!(record.product(), Product::StashAccount);

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"product\":\"stash_account\""));
        let back: CustomerRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_scenario_names_serialize_as_labels() {
        assert_eq!(
            serde_json::to_string(&ScenarioKind::TopUpToTierCap).unwrap(),
            "\"Top-up to Tier Cap\""
        );
        assert_eq!(ScenarioKind::QualifyForBonus.to_string(), "Qualify for Bonus");
    }
}
