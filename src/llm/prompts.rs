use crate::config::AdvisorConfig;
use crate::error::Result;
use crate::schema::{InterestReport, Product};

const MESSAGE_PROMPT: &str = r#"
## Role
You are a product specialist for the {product}. A calculation engine has already
worked out this customer's interest and what-if scenarios. Your only task is to
write a short, friendly message the relationship banker can send to the customer.

## Constraints
- Do not fabricate numbers or rules. Only use figures from "Report" and "Product Rules".
- Do not recompute any amount; quote the report's figures as they are.
- Do not recommend a lower balance, level or tier.
- All amounts are in SGD and monthly.
- Keep it under 80 words.

## Report
{report}

## Product Rules
{rules}

## Return EXACTLY this JSON (no extra text):
{ "banker_message": "<message>" }
"#;

pub fn build_prompt(report: &InterestReport, config: &AdvisorConfig) -> Result<String> {
    let rules = match report.product {
        Product::OneAccount => config.one_account.describe(),
        Product::StashAccount => config.stash.describe(),
    };

    Ok(MESSAGE_PROMPT
        .replace("{product}", &report.product.to_string())
        .replace("{report}", &serde_json::to_string_pretty(report)?)
        .replace("{rules}", &serde_json::to_string_pretty(&rules)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Advisor;
    use crate::schema::{CustomerRecord, StashCustomer};
    use chrono::NaiveDate;

    #[test]
    fn test_prompt_embeds_report_and_rules() {
        let config = AdvisorConfig::default();
        let report = Advisor::new(config.clone())
            .build_report(&CustomerRecord::StashAccount(StashCustomer {
                customer_id: "S001".to_string(),
                customer_name: None,
                snap_date: NaiveDate::from_ymd_opt(2025, 8, 31).unwrap(),
                average_balance_last_month: 51_000.0,
                average_balance_this_month: 49_000.0,
            }))
            .unwrap();

        let prompt = build_prompt(&report, &config).unwrap();
        assert!(prompt.contains("product specialist for the Stash Account"));
        assert!(prompt.contains("\"customer_id\": \"S001\""));
        assert!(prompt.contains("Bonus Rate"));
        assert!(prompt.contains("\"banker_message\""));
    }
}
