//! # Interest Advisor
//!
//! Computes monthly interest for tiered savings products and simulates the
//! "what-if" actions that would raise it, then picks the best next step for
//! each customer.
//!
//! ## Core Concepts
//!
//! - **Level**: One Account qualification (card spend, salary credit, GIRO debits)
//! - **Tier**: a balance band with its own bonus rate. Bonus is progressive, so
//!   each band's rate only applies to the slice of balance inside it
//! - **Snap Date**: the month-end the averages belong to. It fixes the day count
//!   used to pro-rate annual rates
//! - **Scenario**: a hypothetical change (upgrade level, top up, next tier) with
//!   its recomputed interest and gain over the current position
//!
//! All arithmetic is deterministic. Each interest component is floored to
//! cents, and totals are sums of floored components.
//!
//! ## Example
//!
//! ```rust,ignore
//! use interest_advisor::*;
//! use chrono::NaiveDate;
//!
//! let record = CustomerRecord::OneAccount(OneAccountCustomer {
//!     customer_id: "C001".to_string(),
//!     customer_name: Some("Alice Tan".to_string()),
//!     snap_date: NaiveDate::from_ymd_opt(2025, 8, 31).unwrap(),
//!     avg_balance: 120_000.0,
//!     salary_credit: 1_400.0,
//!     card_spend: 700.0,
//!     giro_count: 2,
//! });
//!
//! let report = generate_report(&record).unwrap();
//! assert_eq!(report.recommended_action.chosen_scenario, Some(ScenarioKind::UpgradeLevel));
//! ```

pub mod audit;
pub mod banding;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingestion;
pub mod pipeline;
pub mod products;
pub mod report;
pub mod schema;
pub mod simulation;
pub mod utils;

#[cfg(feature = "ollama")]
pub mod llm;

pub use audit::{verify_report, ReportAuditor};
pub use banding::{TierBand, TierSchedule};
pub use config::{AdvisorConfig, OllamaSettings};
pub use engine::{DayCount, InterestEngine};
pub use error::{AdvisorError, Result};
pub use ingestion::{read_customers, read_customers_file, RowError, RowResult};
pub use pipeline::{Advisor, FailedRecord, Narrator, ProcessedRecord, RecordOutcome, TemplateNarrator};
pub use products::{Level, OneAccountRules, StashRules};
pub use report::{MergedRow, MergedView, ResultRow};
pub use schema::*;
pub use utils::*;

use log::info;
use std::path::Path;

/// Builds a report for one customer using the default product tables.
pub fn generate_report(record: &CustomerRecord) -> Result<InterestReport> {
    Advisor::new(AdvisorConfig::default()).build_report(record)
}

/// Reads a customer CSV and processes every row. Unreadable rows come back
/// as failed outcomes alongside the rest.
pub fn process_customers_file(
    advisor: &Advisor,
    path: impl AsRef<Path>,
    product: Product,
) -> Result<Vec<RecordOutcome>> {
    let path = path.as_ref();
    info!("Reading {} customers from {}", product, path.display());
    let rows = read_customers_file(path, product)?;
    Ok(advisor.process_rows(rows, product))
}
