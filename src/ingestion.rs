use crate::error::Result;
use crate::schema::{CustomerRecord, OneAccountCustomer, Product, StashCustomer};
use crate::utils::parse_snap_date;
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// A CSV row that could not be turned into a customer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based line number in the source file, header included.
    pub line: u64,
    pub customer_id: Option<String>,
    pub error: String,
}

pub type RowResult = std::result::Result<CustomerRecord, RowError>;

#[derive(Debug, Deserialize)]
struct OneAccountRow {
    customer_id: String,
    #[serde(default)]
    customer_name: Option<String>,
    snap_date: String,
    avg_balance: f64,
    salary_credit: f64,
    card_spend: f64,
    giro_count: u32,
}

#[derive(Debug, Deserialize)]
struct StashRow {
    customer_id: String,
    #[serde(default)]
    customer_name: Option<String>,
    snap_date: String,
    average_balance_last_month: f64,
    average_balance_this_month: f64,
}

impl OneAccountRow {
    fn into_record(self) -> Result<CustomerRecord> {
        Ok(CustomerRecord::OneAccount(OneAccountCustomer {
            customer_id: self.customer_id.trim().to_string(),
            customer_name: non_blank(self.customer_name),
            snap_date: parse_snap_date(&self.snap_date)?,
            avg_balance: self.avg_balance,
            salary_credit: self.salary_credit,
            card_spend: self.card_spend,
            giro_count: self.giro_count,
        }))
    }
}

impl StashRow {
    fn into_record(self) -> Result<CustomerRecord> {
        Ok(CustomerRecord::StashAccount(StashCustomer {
            customer_id: self.customer_id.trim().to_string(),
            customer_name: non_blank(self.customer_name),
            snap_date: parse_snap_date(&self.snap_date)?,
            average_balance_last_month: self.average_balance_last_month,
            average_balance_this_month: self.average_balance_this_month,
        }))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads customer rows for a product. A malformed row becomes a `RowError`
/// and the remaining rows are still read; only an unreadable header fails
/// the whole input.
pub fn read_customers<R: Read>(reader: R, product: Product) -> Result<Vec<RowResult>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let id_column = headers.iter().position(|h| h == "customer_id");

    let mut rows = Vec::new();
    for (idx, record) in csv_reader.records().enumerate() {
        let line = idx as u64 + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                rows.push(Err(RowError {
                    line,
                    customer_id: None,
                    error: e.to_string(),
                }));
                continue;
            }
        };

        rows.push(
            parse_row(&record, &headers, product).map_err(|error| RowError {
                line,
                customer_id: id_column
                    .and_then(|i| record.get(i))
                    .map(str::to_string)
                    .filter(|s| !s.is_empty()),
                error,
            }),
        );
    }

    Ok(rows)
}

fn parse_row(
    record: &StringRecord,
    headers: &StringRecord,
    product: Product,
) -> std::result::Result<CustomerRecord, String> {
    let parsed = match product {
        Product::OneAccount => record
            .deserialize::<OneAccountRow>(Some(headers))
            .map_err(|e| e.to_string())?
            .into_record(),
        Product::StashAccount => record
            .deserialize::<StashRow>(Some(headers))
            .map_err(|e| e.to_string())?
            .into_record(),
    };
    parsed.map_err(|e| e.to_string())
}

pub fn read_customers_file(path: impl AsRef<Path>, product: Product) -> Result<Vec<RowResult>> {
    let file = std::fs::File::open(path)?;
    read_customers(file, product)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_read_one_account_rows() {
        let data = "\
customer_id,customer_name,snap_date,avg_balance,card_spend,salary_credit,giro_count
C001,Alice Tan,2025-08-31,127000,700,2000,3
C002,,2025-08-31,75000,700,1600,0
";
        let rows = read_customers(data.as_bytes(), Product::OneAccount).unwrap();
        assert_eq!(rows.len(), 2);

        match rows[0].as_ref().unwrap() {
            CustomerRecord::OneAccount(c) => {
                assert_eq!(c.customer_id, "C001");
                assert_eq!(c.customer_name.as_deref(), Some("Alice Tan"));
                assert_eq!(c.snap_date, NaiveDate::from_ymd_opt(2025, 8, 31).unwrap());
                assert_eq!(c.avg_balance, 127_000.0);
                assert_eq!(c.giro_count, 3);
            }
            other => panic!("unexpected record {:?}", other),
        }

        assert_eq!(rows[1].as_ref().unwrap().customer_name(), None);
    }

    #[test]
    fn test_bad_row_does_not_stop_the_rest() {
        let data = "\
customer_id,snap_date,avg_balance,card_spend,salary_credit,giro_count
C001,2025-08-31,not-a-number,700,2000,3
C002,31/08/2025,75000,700,1600,0
C003,2025-08-31,50000,700,0,0
";
        let rows = read_customers(data.as_bytes(), Product::OneAccount).unwrap();
        assert_eq!(rows.len(), 3);

        let first = rows[0].as_ref().unwrap_err();
        assert_eq!(first.line, 2);
        assert_eq!(first.customer_id.as_deref(), Some("C001"));

        let second = rows[1].as_ref().unwrap_err();
        assert!(second.error.contains("snap date"));

        assert!(rows[2].is_ok());
    }

    #[test]
    fn test_missing_qualification_column_fails_the_row() {
        let data = "\
customer_id,snap_date,avg_balance,salary_credit,giro_count
C001,2025-08-31,120000,2000,3
";
        let rows = read_customers(data.as_bytes(), Product::OneAccount).unwrap();
        assert_eq!(rows.len(), 1);

        let err = rows[0].as_ref().unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.customer_id.as_deref(), Some("C001"));
        assert!(err.error.contains("card_spend"));
    }

    #[test]
    fn test_read_stash_rows() {
        let data = "\
customer_id,customer_name,snap_date,average_balance_last_month,average_balance_this_month
S001,Ben Lim,2025-08-31,51000,49000
";
        let rows = read_customers(data.as_bytes(), Product::StashAccount).unwrap();
        match rows[0].as_ref().unwrap() {
            CustomerRecord::StashAccount(c) => {
                assert_eq!(c.average_balance_last_month, 51_000.0);
                assert_eq!(c.average_balance_this_month, 49_000.0);
            }
            other => panic!("unexpected record {:?}", other),
        }
    }
}
