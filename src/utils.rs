use crate::error::{AdvisorError, Result};
use chrono::{Datelike, Days, NaiveDate};

/// Slack applied before flooring so that amounts which are exact hundredths
/// in decimal are not pushed down a cent by binary representation error.
const CENT_EPSILON: f64 = 1e-7;

pub fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .ok_or_else(|| AdvisorError::DateError(format!("Invalid year/month: {}-{}", year, month)))
}

/// Number of calendar days in the month the snap date falls in.
pub fn days_in_month(date: NaiveDate) -> Result<u32> {
    Ok(last_day_of_month(date.year(), date.month())?.day())
}

pub fn days_in_year(date: NaiveDate) -> u32 {
    if date.leap_year() {
        366
    } else {
        365
    }
}

/// Parses a snap date in "YYYY-MM-DD" format
pub fn parse_snap_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AdvisorError::DateError(format!(
            "Invalid snap date: {}. Expected YYYY-MM-DD",
            value
        ))
    })
}

/// Rounds DOWN to the nearest hundredth.
pub fn floor_cents(amount: f64) -> f64 {
    (amount * 100.0 + CENT_EPSILON).floor() / 100.0
}

/// Rounds to the nearest hundredth. Only meant for sums and differences of
/// amounts that are already whole cents.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Interest earned on `balance` at `annual_rate_pct` over `days_in_period`,
/// pro-rated on a `days_in_year` basis and floored to cents.
pub fn pro_rated_interest(
    balance: f64,
    annual_rate_pct: f64,
    days_in_period: u32,
    days_in_year: u32,
) -> f64 {
    if balance <= 0.0 || annual_rate_pct <= 0.0 || days_in_year == 0 {
        return 0.0;
    }
    let raw = balance * annual_rate_pct / 100.0 * f64::from(days_in_period)
        / f64::from(days_in_year);
    floor_cents(raw)
}

/// Formats an amount as "S$1,234.56".
pub fn format_sgd(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}S${}.{:02}", sign, grouped, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_in_month() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 31).unwrap();
        assert_eq!(days_in_month(date).unwrap(), 31);

        let date = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        assert_eq!(days_in_month(date).unwrap(), 29);

        let date = NaiveDate::from_ymd_opt(2023, 2, 28).unwrap();
        assert_eq!(days_in_month(date).unwrap(), 28);

        let date = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(days_in_month(date).unwrap(), 31);
    }

    #[test]
    fn test_days_in_year() {
        assert_eq!(days_in_year(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()), 366);
        assert_eq!(days_in_year(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()), 365);
        assert_eq!(days_in_year(NaiveDate::from_ymd_opt(2100, 1, 31).unwrap()), 365);
    }

    #[test]
    fn test_floor_cents_rounds_down() {
        assert_eq!(floor_cents(92.3630), 92.36);
        assert_eq!(floor_cents(3.18999), 3.18);
        assert_eq!(floor_cents(0.009), 0.0);
        // Exact hundredths must survive binary representation
        assert_eq!(floor_cents(0.29), 0.29);
        assert_eq!(floor_cents(1.15), 1.15);
    }

    #[test]
    fn test_floor_cents_slack_is_small() {
        // Within 1e-7 of a cent rounds up to it
        assert_eq!(floor_cents(0.29 - 1e-12), 0.29);
        // Anything further below still floors
        assert_eq!(floor_cents(0.2899999), 0.28);
        assert_eq!(floor_cents(0.28999), 0.28);
    }

    #[test]
    fn test_pro_rated_interest() {
        // 75,000 at 1.45% for 31 of 365 days = 92.363...
        assert_eq!(pro_rated_interest(75_000.0, 1.45, 31, 365), 92.36);
        // 75,000 at 0.05% for 31 of 365 days = 3.184...
        assert_eq!(pro_rated_interest(75_000.0, 0.05, 31, 365), 3.18);
        assert_eq!(pro_rated_interest(0.0, 1.45, 31, 365), 0.0);
        assert_eq!(pro_rated_interest(10_000.0, 0.0, 31, 365), 0.0);
    }

    #[test]
    fn test_parse_snap_date() {
        assert_eq!(
            parse_snap_date("2025-08-31").unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 31).unwrap()
        );
        assert!(parse_snap_date("31/08/2025").is_err());
        assert!(parse_snap_date("2025-02-30").is_err());
    }

    #[test]
    fn test_format_sgd() {
        assert_eq!(format_sgd(127_000.0), "S$127,000.00");
        assert_eq!(format_sgd(95.54), "S$95.54");
        assert_eq!(format_sgd(0.0), "S$0.00");
        assert_eq!(format_sgd(1_234_567.891), "S$1,234,567.89");
    }
}
