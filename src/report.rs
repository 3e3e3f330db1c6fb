//! Result files and the text viewer.
//!
//! Results are written twice: a JSON array with the full reports, and a flat
//! CSV with one row per customer. The viewer left-joins the customer CSV with
//! the result rows and renders one customer at a time.

use crate::error::{AdvisorError, Result};
use crate::pipeline::RecordOutcome;
use crate::schema::Product;
use crate::utils::format_sgd;
use chrono::NaiveDateTime;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const PLACEHOLDER: &str = "—";
const RAW_JSON_LIMIT: usize = 5_000;

/// `<product>_interest_simulation_<YYYYmmddHHMMSS>.json`
pub fn default_json_name(product: Product, now: NaiveDateTime) -> String {
    format!(
        "{}_interest_simulation_{}.json",
        product.file_stem(),
        now.format("%Y%m%d%H%M%S")
    )
}

pub fn default_rows_name(product: Product) -> String {
    format!("{}_interest_simulation_rows.csv", product.file_stem())
}

pub fn write_json(path: impl AsRef<Path>, outcomes: &[RecordOutcome]) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(outcomes)?;
    std::fs::write(path, json)?;
    info!("Saved {} results to {}", outcomes.len(), path.display());
    Ok(())
}

/// Flat per-customer row. Numbers are kept as text so the viewer can fall
/// back to a placeholder when a file was edited by hand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub customer_id: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub snap_date: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub current_level: String,
    #[serde(default)]
    pub current_tier: String,
    #[serde(default)]
    pub current_total_interest_month: String,
    #[serde(default)]
    pub chosen_scenario: String,
    #[serde(default)]
    pub recommended_incremental_gain_vs_current: String,
    #[serde(default)]
    pub banker_message: String,
    #[serde(default)]
    pub result_json: String,
    #[serde(default)]
    pub error: String,
}

impl ResultRow {
    pub fn from_outcome(outcome: &RecordOutcome) -> Result<Self> {
        match outcome {
            RecordOutcome::Processed(p) => {
                let report = &p.report;
                Ok(Self {
                    customer_id: report.customer_id.clone(),
                    customer_name: report.customer_name.clone().unwrap_or_default(),
                    snap_date: report.snap_date.to_string(),
                    product: report.product.to_string(),
                    current_level: report
                        .current
                        .level
                        .map(|l| l.to_string())
                        .unwrap_or_default(),
                    current_tier: report.current.tier.clone(),
                    current_total_interest_month: format!(
                        "{:.2}",
                        report.current.interest.total_interest_month
                    ),
                    chosen_scenario: report
                        .recommended_action
                        .chosen_scenario
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "None".to_string()),
                    recommended_incremental_gain_vs_current: format!(
                        "{:.2}",
                        report.recommended_action.recommended_incremental_gain_vs_current
                    ),
                    banker_message: p.banker_message.clone(),
                    result_json: serde_json::to_string(outcome)?,
                    error: String::new(),
                })
            }
            RecordOutcome::Failed(f) => Ok(Self {
                customer_id: f.customer_id.clone().unwrap_or_default(),
                snap_date: f.snap_date.map(|d| d.to_string()).unwrap_or_default(),
                product: f.product.to_string(),
                error: f.error.clone(),
                ..Self::default()
            }),
        }
    }
}

pub fn write_rows<W: Write>(writer: W, outcomes: &[RecordOutcome]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for outcome in outcomes {
        csv_writer.serialize(ResultRow::from_outcome(outcome)?)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_rows_csv(path: impl AsRef<Path>, outcomes: &[RecordOutcome]) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    write_rows(file, outcomes)?;
    info!("Saved {} rows to {}", outcomes.len(), path.display());
    Ok(())
}

pub fn read_rows<R: Read>(reader: R) -> Result<Vec<ResultRow>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for row in csv_reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

pub fn read_rows_csv(path: impl AsRef<Path>) -> Result<Vec<ResultRow>> {
    read_rows(std::fs::File::open(path)?)
}

/// Customer CSV as plain column -> value maps, so either product's file
/// can be joined without knowing its layout.
pub fn read_customer_table<R: Read>(reader: R) -> Result<Vec<BTreeMap<String, String>>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut table = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        table.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect(),
        );
    }
    Ok(table)
}

pub fn read_customer_table_file(path: impl AsRef<Path>) -> Result<Vec<BTreeMap<String, String>>> {
    read_customer_table(std::fs::File::open(path)?)
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub customer_id: String,
    pub inputs: BTreeMap<String, String>,
    pub result: Option<ResultRow>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedView {
    pub rows: Vec<MergedRow>,
}

impl MergedView {
    /// Left join on `customer_id`: every customer appears, with or without a
    /// result. When a customer has several result rows the last one wins.
    pub fn left_join(customers: Vec<BTreeMap<String, String>>, results: Vec<ResultRow>) -> Self {
        let mut by_id: BTreeMap<String, ResultRow> = BTreeMap::new();
        for row in results {
            by_id.insert(row.customer_id.trim().to_string(), row);
        }

        let rows = customers
            .into_iter()
            .filter_map(|inputs| {
                let id = inputs.get("customer_id")?.trim().to_string();
                if id.is_empty() {
                    return None;
                }
                let result = by_id.get(&id).cloned();
                Some(MergedRow {
                    customer_id: id,
                    inputs,
                    result,
                })
            })
            .collect();

        Self { rows }
    }

    pub fn ids(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.customer_id.as_str()).collect()
    }

    pub fn find(&self, customer_id: &str) -> Option<&MergedRow> {
        self.rows.iter().find(|r| r.customer_id == customer_id)
    }
}

fn field<'a>(row: &'a MergedRow, key: &str) -> Option<&'a str> {
    row.inputs
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn money_or_placeholder(value: Option<&str>) -> String {
    value
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(format_sgd)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn count_or_placeholder(value: Option<&str>) -> String {
    value
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| format!("{}", v as i64))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn text_or_placeholder(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        PLACEHOLDER
    } else {
        trimmed
    }
}

/// Renders one customer as a text page.
pub fn render(row: &MergedRow) -> String {
    let mut out = String::new();
    let mut line = |text: String| {
        out.push_str(&text);
        out.push('\n');
    };

    line("Customer Inputs".to_string());
    line("---------------".to_string());
    line(format!("Name:          {}", field(row, "customer_name").unwrap_or(PLACEHOLDER)));
    line(format!("ID:            {}", row.customer_id));
    line(format!("Snap Date:     {}", field(row, "snap_date").unwrap_or(PLACEHOLDER)));

    let is_stash = row.inputs.contains_key("average_balance_this_month");
    if is_stash {
        line(format!(
            "Last Month:    {}",
            money_or_placeholder(field(row, "average_balance_last_month"))
        ));
        line(format!(
            "This Month:    {}",
            money_or_placeholder(field(row, "average_balance_this_month"))
        ));
    } else {
        line(format!("Avg Balance:   {}", money_or_placeholder(field(row, "avg_balance"))));
        line(format!("Card Spend:    {}", money_or_placeholder(field(row, "card_spend"))));
        line(format!("Salary Credit: {}", money_or_placeholder(field(row, "salary_credit"))));
        line(format!("GIRO Count:    {}", count_or_placeholder(field(row, "giro_count"))));
    }
    line(String::new());

    line("Summary".to_string());
    line("-------".to_string());
    let Some(result) = &row.result else {
        line("No result found for this customer.".to_string());
        return out;
    };

    if !result.error.trim().is_empty() {
        line(format!("Error: {}", result.error.trim()));
    }
    if result.banker_message.trim().is_empty() {
        line("No summary found for this customer.".to_string());
    } else {
        line(result.banker_message.trim().to_string());
    }
    line(String::new());

    line("Current Status".to_string());
    line("--------------".to_string());
    line(format!("Level:                 {}", text_or_placeholder(&result.current_level)));
    line(format!("Tier:                  {}", text_or_placeholder(&result.current_tier)));
    line(format!(
        "Est. Interest (Month): {}",
        money_or_placeholder(Some(result.current_total_interest_month.trim()))
    ));
    line(format!("Recommendation:        {}", text_or_placeholder(&result.chosen_scenario)));
    line(format!(
        "Gain (Month):          {}",
        money_or_placeholder(Some(result.recommended_incremental_gain_vs_current.trim()))
    ));
    line(String::new());

    line("Full Result JSON".to_string());
    line("----------------".to_string());
    line(render_json(&result.result_json));

    out
}

/// Pretty JSON when it parses, otherwise the raw text cut to a readable size.
pub fn render_json(raw: &str) -> String {
    if raw.trim().is_empty() {
        return "No JSON available.".to_string();
    }
    match serde_json::from_str::<serde_json::Value>(raw)
        .and_then(|v| serde_json::to_string_pretty(&v))
    {
        Ok(pretty) => pretty,
        Err(_) => raw.chars().take(RAW_JSON_LIMIT).collect(),
    }
}

/// Writes `<customer_id>_result.json` into `dir` and returns its path.
pub fn export_result_json(row: &MergedRow, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let id = row.customer_id.as_str();
    if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\', '\0']) {
        return Err(AdvisorError::validation(
            id,
            "customer id cannot be used as a file name",
        ));
    }

    let result = row
        .result
        .as_ref()
        .filter(|r| !r.result_json.trim().is_empty())
        .ok_or_else(|| {
            AdvisorError::validation(row.customer_id.clone(), "no result JSON to export")
        })?;

    let value: serde_json::Value = serde_json::from_str(&result.result_json)?;
    let path = dir
        .as_ref()
        .join(format!("{}_result.json", row.customer_id));
    std::fs::write(&path, serde_json::to_string_pretty(&value)?)?;
    info!("Exported result for {} to {}", row.customer_id, path.display());
    Ok(path)
}
