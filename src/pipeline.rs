use crate::audit::verify_report;
use crate::config::AdvisorConfig;
use crate::engine::InterestEngine;
use crate::error::Result;
use crate::ingestion::RowResult;
use crate::schema::*;
use crate::simulation::{recommend, simulate_one_account, simulate_stash};
use crate::utils::format_sgd;
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Turns a finished report into a short message for the banker.
pub trait Narrator {
    fn narrate(&self, report: &InterestReport) -> Result<String>;
}

/// Fixed-wording summary built straight from the report numbers.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateNarrator;

impl Narrator for TemplateNarrator {
    fn narrate(&self, report: &InterestReport) -> Result<String> {
        let greeting = match &report.customer_name {
            Some(name) => format!("Hi {},", name),
            None => "Hi,".to_string(),
        };

        let standing = match report.current.level {
            Some(level) => format!("{}, {}", level, report.current.tier),
            None if report.current.bonus_eligible => format!("{}, bonus qualified", report.current.tier),
            None => format!("{}, bonus not qualified", report.current.tier),
        };

        let mut message = format!(
            "{} your {} is earning {} this month ({}).",
            greeting,
            report.product,
            format_sgd(report.current.interest.total_interest_month),
            standing
        );

        match report.chosen_simulation() {
            Some(sim) => {
                message.push_str(&format!(
                    " Recommended: {} ({}). This adds {} per month.",
                    sim.name,
                    sim.assumption,
                    format_sgd(sim.incremental_gain_vs_current)
                ));
            }
            None => message.push_str(" You are already getting the most out of this account."),
        }

        Ok(message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    #[serde(flatten)]
    pub report: InterestReport,
    pub banker_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedRecord {
    pub product: Product,
    pub customer_id: Option<String>,
    pub snap_date: Option<NaiveDate>,
    pub error: String,
}

/// Per-record result. A failure carries its message instead of aborting
/// the batch; nothing is retried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordOutcome {
    Processed(Box<ProcessedRecord>),
    Failed(FailedRecord),
}

impl RecordOutcome {
    pub fn customer_id(&self) -> Option<&str> {
        match self {
            RecordOutcome::Processed(p) => Some(&p.report.customer_id),
            RecordOutcome::Failed(f) => f.customer_id.as_deref(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RecordOutcome::Failed(_))
    }
}

pub struct Advisor {
    config: AdvisorConfig,
    narrator: Option<Box<dyn Narrator>>,
}

impl Advisor {
    pub fn new(config: AdvisorConfig) -> Self {
        Self {
            config,
            narrator: None,
        }
    }

    /// Attaches a narrator, e.g. a language model. Without one the
    /// `TemplateNarrator` wording is used.
    pub fn with_narrator(mut self, narrator: Box<dyn Narrator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    fn engine(&self) -> InterestEngine<'_> {
        InterestEngine::new(&self.config.one_account, &self.config.stash)
    }

    /// Current snapshot, scenarios and recommendation for one customer.
    pub fn build_report(&self, record: &CustomerRecord) -> Result<InterestReport> {
        let engine = self.engine();

        let (current, simulations) = match record {
            CustomerRecord::OneAccount(c) => {
                let current = engine.one_account_snapshot(c)?;
                let sims = simulate_one_account(&engine, c, &current);
                (current, sims)
            }
            CustomerRecord::StashAccount(c) => {
                let current = engine.stash_snapshot(c)?;
                let sims = simulate_stash(&engine, c, &current);
                (current, sims)
            }
        };

        let recommended_action = recommend(record, &current, &simulations, &engine);

        let report = InterestReport {
            product: record.product(),
            customer_id: record.customer_id().to_string(),
            customer_name: record.customer_name().map(str::to_string),
            snap_date: record.snap_date(),
            current,
            simulations,
            recommended_action,
        };

        verify_report(&report, self.config.audit_tolerance)?;
        Ok(report)
    }

    fn narrate(&self, report: &InterestReport) -> String {
        if let Some(narrator) = &self.narrator {
            match narrator.narrate(report) {
                Ok(message) => return message,
                Err(e) => warn!(
                    "Narrator failed for customer {}, using template: {}",
                    report.customer_id, e
                ),
            }
        }
        // Infallible for the template wording
        TemplateNarrator.narrate(report).unwrap_or_default()
    }

    pub fn process(&self, record: &CustomerRecord) -> RecordOutcome {
        match self.build_report(record) {
            Ok(report) => {
                let banker_message = self.narrate(&report);
                RecordOutcome::Processed(Box::new(ProcessedRecord {
                    report,
                    banker_message,
                }))
            }
            Err(e) => {
                warn!("Customer {} failed: {}", record.customer_id(), e);
                RecordOutcome::Failed(FailedRecord {
                    product: record.product(),
                    customer_id: Some(record.customer_id().to_string()),
                    snap_date: Some(record.snap_date()),
                    error: e.to_string(),
                })
            }
        }
    }

    /// Processes records one at a time, in order.
    pub fn process_batch(&self, records: &[CustomerRecord]) -> Vec<RecordOutcome> {
        let rows: Vec<RowResult> = records.iter().cloned().map(Ok).collect();
        self.process_rows(rows, records.first().map(|r| r.product()).unwrap_or(Product::OneAccount))
    }

    /// Like `process_batch`, but takes rows straight from ingestion so that
    /// unreadable rows show up as failures in the output.
    pub fn process_rows(&self, rows: Vec<RowResult>, product: Product) -> Vec<RecordOutcome> {
        let total = rows.len();
        info!("Processing {} {} records", total, product);

        let pacing = self.config.pacing();
        let mut outcomes = Vec::with_capacity(total);

        for (idx, row) in rows.into_iter().enumerate() {
            if idx > 0 && self.narrator.is_some() && !pacing.is_zero() {
                std::thread::sleep(pacing);
            }

            let outcome = match row {
                Ok(record) => {
                    debug!(
                        "[{}/{}] Processing customer {} snap_date {}",
                        idx + 1,
                        total,
                        record.customer_id(),
                        record.snap_date()
                    );
                    self.process(&record)
                }
                Err(row_error) => {
                    warn!("Skipping line {}: {}", row_error.line, row_error.error);
                    RecordOutcome::Failed(FailedRecord {
                        product,
                        customer_id: row_error.customer_id,
                        snap_date: None,
                        error: format!("line {}: {}", row_error.line, row_error.error),
                    })
                }
            };
            outcomes.push(outcome);
        }

        let failed = outcomes.iter().filter(|o| o.is_failed()).count();
        info!(
            "Completed {} records ({} succeeded, {} failed)",
            total,
            total - failed,
            failed
        );

        outcomes
    }
}
