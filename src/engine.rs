use crate::banding::TierSchedule;
use crate::error::{AdvisorError, Result};
use crate::products::{Level, OneAccountRules, StashRules};
use crate::schema::*;
use crate::utils::{days_in_month, days_in_year, pro_rated_interest, round_cents};
use chrono::NaiveDate;
use log::debug;

/// Day-count context for a snap date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCount {
    pub days_in_month: u32,
    pub days_in_year: u32,
}

impl DayCount {
    pub fn for_snap_date(snap_date: NaiveDate) -> Result<Self> {
        Ok(Self {
            days_in_month: days_in_month(snap_date)?,
            days_in_year: days_in_year(snap_date),
        })
    }
}

/// Monthly base plus progressive bonus interest. Each tier is floored on its
/// own, so the breakdown always adds up to the total.
pub fn compute_breakdown(
    balance: f64,
    base_rate_pct: f64,
    tiers: &TierSchedule,
    bonus_rates_pct: &[f64],
    bonus_eligible: bool,
    days: DayCount,
) -> InterestBreakdown {
    let base = pro_rated_interest(balance, base_rate_pct, days.days_in_month, days.days_in_year);

    let tier_interest: Vec<TierInterest> = tiers
        .bands()
        .iter()
        .zip(tiers.split(balance))
        .zip(bonus_rates_pct.iter().copied().chain(std::iter::repeat(0.0)))
        .map(|((band, portion), rate)| {
            let interest = if bonus_eligible {
                pro_rated_interest(portion, rate, days.days_in_month, days.days_in_year)
            } else {
                0.0
            };
            TierInterest {
                tier: band.name.clone(),
                balance_in_tier: portion,
                rate_pct: rate,
                interest,
            }
        })
        .collect();

    let bonus = round_cents(tier_interest.iter().map(|t| t.interest).sum());

    InterestBreakdown {
        base_interest_month: base,
        tiers: tier_interest,
        bonus_interest_month: bonus,
        total_interest_month: round_cents(base + bonus),
    }
}

pub struct InterestEngine<'a> {
    one_account: &'a OneAccountRules,
    stash: &'a StashRules,
}

impl<'a> InterestEngine<'a> {
    pub fn new(one_account: &'a OneAccountRules, stash: &'a StashRules) -> Self {
        Self { one_account, stash }
    }

    pub fn one_account_rules(&self) -> &OneAccountRules {
        self.one_account
    }

    pub fn stash_rules(&self) -> &StashRules {
        self.stash
    }

    /// Interest for a One Account balance at a given level.
    pub fn one_account_interest(&self, balance: f64, level: Level, days: DayCount) -> InterestBreakdown {
        let rates = self.one_account.bonus_rates(level);
        compute_breakdown(
            balance,
            self.one_account.base_rate_pct,
            &self.one_account.tiers,
            &rates,
            level != Level::Unqualified,
            days,
        )
    }

    /// Interest for a Stash balance. Bonus only when `this_month >= last_month`.
    pub fn stash_interest(&self, last_month: f64, this_month: f64, days: DayCount) -> InterestBreakdown {
        compute_breakdown(
            this_month,
            self.stash.base_rate_pct,
            &self.stash.tiers,
            &self.stash.bonus_pct,
            self.stash.is_bonus_eligible(last_month, this_month),
            days,
        )
    }

    pub fn one_account_snapshot(&self, customer: &OneAccountCustomer) -> Result<CurrentSnapshot> {
        validate_one_account(customer)?;
        let days = DayCount::for_snap_date(customer.snap_date)?;
        let level = self.one_account.qualify(
            customer.card_spend,
            customer.salary_credit,
            customer.giro_count,
        );
        let interest = self.one_account_interest(customer.avg_balance, level, days);

        debug!(
            "Customer {}: {} / {} -> total {:.2}",
            customer.customer_id,
            level,
            self.one_account.tiers.tier_for(customer.avg_balance).name,
            interest.total_interest_month
        );

        Ok(CurrentSnapshot {
            avg_balance: customer.avg_balance,
            average_balance_last_month: None,
            level: Some(level),
            tier: self.one_account.tiers.tier_for(customer.avg_balance).name.clone(),
            days_in_month: days.days_in_month,
            days_in_year: days.days_in_year,
            bonus_eligible: level != Level::Unqualified,
            interest,
        })
    }

    pub fn stash_snapshot(&self, customer: &StashCustomer) -> Result<CurrentSnapshot> {
        validate_stash(customer)?;
        let days = DayCount::for_snap_date(customer.snap_date)?;
        let last = customer.average_balance_last_month;
        let this = customer.average_balance_this_month;
        let interest = self.stash_interest(last, this, days);

        debug!(
            "Customer {}: {} (eligible: {}) -> total {:.2}",
            customer.customer_id,
            self.stash.tiers.tier_for(this).name,
            self.stash.is_bonus_eligible(last, this),
            interest.total_interest_month
        );

        Ok(CurrentSnapshot {
            avg_balance: this,
            average_balance_last_month: Some(last),
            level: None,
            tier: self.stash.tiers.tier_for(this).name.clone(),
            days_in_month: days.days_in_month,
            days_in_year: days.days_in_year,
            bonus_eligible: self.stash.is_bonus_eligible(last, this),
            interest,
        })
    }
}

fn validate_amount(customer_id: &str, field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(AdvisorError::validation(
            customer_id,
            format!("{} is not a finite number", field),
        ));
    }
    if value < 0.0 {
        return Err(AdvisorError::validation(
            customer_id,
            format!("{} cannot be negative (got {})", field, value),
        ));
    }
    Ok(())
}

fn validate_customer_id(customer_id: &str) -> Result<()> {
    if customer_id.trim().is_empty() {
        return Err(AdvisorError::validation(
            "<blank>",
            "customer_id must not be empty",
        ));
    }
    Ok(())
}

pub fn validate_one_account(customer: &OneAccountCustomer) -> Result<()> {
    validate_customer_id(&customer.customer_id)?;
    validate_amount(&customer.customer_id, "avg_balance", customer.avg_balance)?;
    validate_amount(&customer.customer_id, "salary_credit", customer.salary_credit)?;
    validate_amount(&customer.customer_id, "card_spend", customer.card_spend)
}

pub fn validate_stash(customer: &StashCustomer) -> Result<()> {
    validate_customer_id(&customer.customer_id)?;
    validate_amount(
        &customer.customer_id,
        "average_balance_last_month",
        customer.average_balance_last_month,
    )?;
    validate_amount(
        &customer.customer_id,
        "average_balance_this_month",
        customer.average_balance_this_month,
    )
}
