//! What-if scenarios, evaluated in a fixed priority order.
//!
//! One Account: Upgrade Level, then Top-up to Tier Cap, then Upgrade Tier.
//! Stash Account: Qualify for Bonus, then Top-up to Tier Cap, then Upgrade Tier.
//!
//! Every scenario is always reported. The recommendation is the first one,
//! in that order, whose total interest beats the current total.

use crate::engine::{DayCount, InterestEngine};
use crate::products::Level;
use crate::schema::*;
use crate::utils::{format_sgd, round_cents};
use log::debug;

/// Everything a scenario changes relative to the current position.
struct Outcome {
    new_level: Option<Level>,
    new_tier: String,
    new_balance: f64,
    interest: InterestBreakdown,
}

fn applicable(
    kind: ScenarioKind,
    assumption: String,
    current: &CurrentSnapshot,
    outcome: Outcome,
) -> Simulation {
    let current_total = current.interest.total_interest_month;
    let gain = round_cents(outcome.interest.total_interest_month - current_total);
    let explanation = format!(
        "{} (simulated) - {} (current) = {} per month",
        format_sgd(outcome.interest.total_interest_month),
        format_sgd(current_total),
        format_sgd(gain)
    );

    Simulation {
        name: kind,
        assumption,
        applicable: true,
        new_level: outcome.new_level,
        new_tier: outcome.new_tier,
        new_avg_balance: outcome.new_balance,
        top_up_amount: round_cents((outcome.new_balance - current.avg_balance).max(0.0)),
        interest: outcome.interest,
        incremental_gain_vs_current: gain,
        explanation,
    }
}

/// A scenario that cannot improve on today's position. It mirrors the
/// current snapshot with zero gain.
fn not_applicable(kind: ScenarioKind, assumption: String, reason: String, current: &CurrentSnapshot) -> Simulation {
    Simulation {
        name: kind,
        assumption,
        applicable: false,
        new_level: current.level,
        new_tier: current.tier.clone(),
        new_avg_balance: current.avg_balance,
        top_up_amount: 0.0,
        interest: current.interest.clone(),
        incremental_gain_vs_current: 0.0,
        explanation: reason,
    }
}

pub fn simulate_one_account(
    engine: &InterestEngine<'_>,
    customer: &OneAccountCustomer,
    current: &CurrentSnapshot,
) -> Vec<Simulation> {
    let rules = engine.one_account_rules();
    let tiers = &rules.tiers;
    let days = DayCount {
        days_in_month: current.days_in_month,
        days_in_year: current.days_in_year,
    };
    let level = current.level.unwrap_or(Level::Unqualified);
    let balance = current.avg_balance;
    let tier_idx = tiers.tier_index_for(balance);

    let mut simulations = Vec::with_capacity(3);

    // 1. Upgrade Level. Without any GIRO debits, Level 1 skips straight to
    // Level 3 via salary credit.
    let target = if level == Level::Level1 && customer.giro_count == 0 {
        Some(Level::Level3)
    } else {
        level.next()
    };
    simulations.push(match target {
        Some(target) => applicable(
            ScenarioKind::UpgradeLevel,
            format!("Increase from {} to {} with the same balance", level, target),
            current,
            Outcome {
                new_level: Some(target),
                new_tier: current.tier.clone(),
                new_balance: balance,
                interest: engine.one_account_interest(balance, target, days),
            },
        ),
        None => not_applicable(
            ScenarioKind::UpgradeLevel,
            "Increase to the next level if not Level 3".to_string(),
            "Already at Level 3, the highest level".to_string(),
            current,
        ),
    });

    // 2. Top-up to the cap of the current tier
    let cap = tiers.cap_of(tier_idx).unwrap_or(balance);
    simulations.push(if balance < cap {
        applicable(
            ScenarioKind::TopUpToTierCap,
            format!("Increase balance to {}, the cap of {}", format_sgd(cap), current.tier),
            current,
            Outcome {
                new_level: Some(level),
                new_tier: current.tier.clone(),
                new_balance: cap,
                interest: engine.one_account_interest(cap, level, days),
            },
        )
    } else {
        not_applicable(
            ScenarioKind::TopUpToTierCap,
            "Increase balance up to cap of current tier".to_string(),
            format!("Balance is already at or above the {} cap of {}", current.tier, format_sgd(cap)),
            current,
        )
    });

    // 3. Upgrade to the next tier, filled to its cap
    simulations.push(match tiers.next_tier(tier_idx) {
        Some(next) => applicable(
            ScenarioKind::UpgradeTier,
            format!("Increase balance to {}, the cap of {}", format_sgd(next.upper), next.name),
            current,
            Outcome {
                new_level: Some(level),
                new_tier: next.name.clone(),
                new_balance: next.upper,
                interest: engine.one_account_interest(next.upper, level, days),
            },
        ),
        None => not_applicable(
            ScenarioKind::UpgradeTier,
            "Increase to the next tier if not in the highest tier".to_string(),
            format!("Already in {}, the highest tier", current.tier),
            current,
        ),
    });

    simulations
}

pub fn simulate_stash(
    engine: &InterestEngine<'_>,
    customer: &StashCustomer,
    current: &CurrentSnapshot,
) -> Vec<Simulation> {
    let rules = engine.stash_rules();
    let tiers = &rules.tiers;
    let days = DayCount {
        days_in_month: current.days_in_month,
        days_in_year: current.days_in_year,
    };
    let last = customer.average_balance_last_month;
    let balance = current.avg_balance;
    let tier_idx = tiers.tier_index_for(balance);

    let mut simulations = Vec::with_capacity(3);

    // 1. Qualify for the bonus by matching last month's balance
    simulations.push(if current.bonus_eligible {
        not_applicable(
            ScenarioKind::QualifyForBonus,
            "Top up to last month's average balance to qualify for bonus".to_string(),
            "Balance was maintained, bonus interest already applies".to_string(),
            current,
        )
    } else {
        applicable(
            ScenarioKind::QualifyForBonus,
            format!("Top up to last month's average balance of {}", format_sgd(last)),
            current,
            Outcome {
                new_level: None,
                new_tier: tiers.tier_for(last).name.clone(),
                new_balance: last,
                interest: engine.stash_interest(last, last, days),
            },
        )
    });

    // 2. Top-up to the cap of the current tier
    let cap = tiers.cap_of(tier_idx).unwrap_or(balance);
    simulations.push(if balance < cap {
        applicable(
            ScenarioKind::TopUpToTierCap,
            format!("Increase balance to {}, the cap of {}", format_sgd(cap), current.tier),
            current,
            Outcome {
                new_level: None,
                new_tier: current.tier.clone(),
                new_balance: cap,
                interest: engine.stash_interest(last, cap, days),
            },
        )
    } else {
        not_applicable(
            ScenarioKind::TopUpToTierCap,
            "Increase balance up to cap of current tier".to_string(),
            format!("Balance is already at or above the {} cap of {}", current.tier, format_sgd(cap)),
            current,
        )
    });

    // 3. Upgrade to the next tier, filled to its cap
    simulations.push(match tiers.next_tier(tier_idx) {
        Some(next) => applicable(
            ScenarioKind::UpgradeTier,
            format!("Increase balance to {}, the cap of {}", format_sgd(next.upper), next.name),
            current,
            Outcome {
                new_level: None,
                new_tier: next.name.clone(),
                new_balance: next.upper,
                interest: engine.stash_interest(last, next.upper, days),
            },
        ),
        None => not_applicable(
            ScenarioKind::UpgradeTier,
            "Increase to the next tier if not in the highest tier".to_string(),
            format!("Already in {}, the highest tier", current.tier),
            current,
        ),
    });

    simulations
}

/// Picks the first scenario, by priority, with a positive gain.
pub fn recommend(
    customer: &CustomerRecord,
    current: &CurrentSnapshot,
    simulations: &[Simulation],
    engine: &InterestEngine<'_>,
) -> RecommendedAction {
    let chosen = simulations
        .iter()
        .find(|s| s.applicable && s.incremental_gain_vs_current > 0.0);

    let Some(sim) = chosen else {
        debug!("Customer {}: no scenario improves interest", customer.customer_id());
        return RecommendedAction {
            chosen_scenario: None,
            reasoning: format!(
                "None of the {} scenarios yields a positive gain over the current {} per month.",
                simulations.len(),
                format_sgd(current.interest.total_interest_month)
            ),
            recommended_incremental_gain_vs_current: 0.0,
            next_steps: vec![
                "Keep the current balance and qualifying activity to retain today's interest.".to_string(),
                "Review again next month in case balances or activity change.".to_string(),
            ],
        };
    };

    let skipped: Vec<String> = simulations
        .iter()
        .take_while(|s| s.name != sim.name)
        .map(|s| format!("{} ({})", s.name, if s.applicable { "no gain" } else { "not applicable" }))
        .collect();

    let mut reasoning = format!(
        "{} is the first scenario by priority with a positive gain: {} vs {} today.",
        sim.name,
        format_sgd(sim.interest.total_interest_month),
        format_sgd(current.interest.total_interest_month)
    );
    if !skipped.is_empty() {
        reasoning.push_str(&format!(" Skipped: {}.", skipped.join(", ")));
    }

    RecommendedAction {
        chosen_scenario: Some(sim.name),
        reasoning,
        recommended_incremental_gain_vs_current: sim.incremental_gain_vs_current,
        next_steps: next_steps(customer, current, sim, engine),
    }
}

fn next_steps(
    customer: &CustomerRecord,
    current: &CurrentSnapshot,
    sim: &Simulation,
    engine: &InterestEngine<'_>,
) -> Vec<String> {
    let mut steps = Vec::new();

    match (sim.name, customer) {
        (ScenarioKind::UpgradeLevel, CustomerRecord::OneAccount(c)) => {
            let rules = engine.one_account_rules();
            if c.card_spend < rules.card_spend_threshold {
                steps.push(format!(
                    "Spend at least {} on the card this month (currently {}).",
                    format_sgd(rules.card_spend_threshold),
                    format_sgd(c.card_spend)
                ));
            } else {
                steps.push(format!(
                    "Keep card spend at or above {}.",
                    format_sgd(rules.card_spend_threshold)
                ));
            }
            match sim.new_level {
                Some(Level::Level2) => steps.push(format!(
                    "Set up at least {} GIRO debit transactions (currently {}).",
                    rules.giro_count_threshold, c.giro_count
                )),
                Some(Level::Level3) => steps.push(format!(
                    "Credit a salary of at least {} to the account (currently {}).",
                    format_sgd(rules.salary_credit_threshold),
                    format_sgd(c.salary_credit)
                )),
                _ => {}
            }
        }
        (ScenarioKind::QualifyForBonus, _) => {
            steps.push(format!(
                "Top up {} so this month's average balance reaches last month's {}.",
                format_sgd(sim.top_up_amount),
                format_sgd(sim.new_avg_balance)
            ));
            steps.push("Keep the monthly average balance at or above the previous month's.".to_string());
        }
        (ScenarioKind::TopUpToTierCap, _) | (ScenarioKind::UpgradeTier, _) => {
            steps.push(format!(
                "Deposit {} to bring the average balance to {} ({}).",
                format_sgd(sim.top_up_amount),
                format_sgd(sim.new_avg_balance),
                sim.new_tier
            ));
            match customer {
                CustomerRecord::OneAccount(_) => steps.push(format!(
                    "Keep the qualifying activity for {}.",
                    current.level.unwrap_or(Level::Unqualified)
                )),
                CustomerRecord::StashAccount(_) => steps.push(
                    "Keep the monthly average balance at or above the previous month's.".to_string(),
                ),
            }
        }
        (ScenarioKind::UpgradeLevel, CustomerRecord::StashAccount(_)) => {}
    }

    steps.push(format!(
        "Expected interest: {} per month, {} more than today.",
        format_sgd(sim.interest.total_interest_month),
        format_sgd(sim.incremental_gain_vs_current)
    ));

    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::{OneAccountRules, StashRules};
    use chrono::NaiveDate;

    fn customer(balance: f64, salary: f64, card: f64, giro: u32) -> OneAccountCustomer {
        OneAccountCustomer {
            customer_id: "C001".to_string(),
            customer_name: None,
            snap_date: NaiveDate::from_ymd_opt(2025, 8, 31).unwrap(),
            avg_balance: balance,
            salary_credit: salary,
            card_spend: card,
            giro_count: giro,
        }
    }

    fn stash(last: f64, this: f64) -> StashCustomer {
        StashCustomer {
            customer_id: "S001".to_string(),
            customer_name: None,
            snap_date: NaiveDate::from_ymd_opt(2025, 8, 31).unwrap(),
            average_balance_last_month: last,
            average_balance_this_month: this,
        }
    }

    fn run_one(c: OneAccountCustomer) -> (CurrentSnapshot, Vec<Simulation>, RecommendedAction) {
        let one = OneAccountRules::default();
        let st = StashRules::default();
        let engine = InterestEngine::new(&one, &st);
        let current = engine.one_account_snapshot(&c).unwrap();
        let sims = simulate_one_account(&engine, &c, &current);
        let rec = recommend(&CustomerRecord::OneAccount(c), &current, &sims, &engine);
        (current, sims, rec)
    }

    fn run_stash(c: StashCustomer) -> (CurrentSnapshot, Vec<Simulation>, RecommendedAction) {
        let one = OneAccountRules::default();
        let st = StashRules::default();
        let engine = InterestEngine::new(&one, &st);
        let current = engine.stash_snapshot(&c).unwrap();
        let sims = simulate_stash(&engine, &c, &current);
        let rec = recommend(&CustomerRecord::StashAccount(c), &current, &sims, &engine);
        (current, sims, rec)
    }

    #[test]
    fn test_level_one_upgrades_to_level_two_with_some_giro() {
        let (current, sims, rec) = run_one(customer(120_000.0, 1_400.0, 700.0, 2));
        assert_eq!(current.level, Some(Level::Level1));
        assert_eq!(current.tier, "Tier 2");
        assert_eq!(current.interest.total_interest_month, 43.3);

        assert_eq!(sims[0].name, ScenarioKind::UpgradeLevel);
        assert_eq!(sims[0].new_level, Some(Level::Level2));
        assert_eq!(sims[0].interest.total_interest_month, 140.12);
        assert_eq!(sims[0].incremental_gain_vs_current, 96.82);

        assert_eq!(sims[1].new_avg_balance, 125_000.0);
        assert_eq!(sims[1].top_up_amount, 5_000.0);
        assert_eq!(sims[1].incremental_gain_vs_current, 0.21);

        assert_eq!(rec.chosen_scenario, Some(ScenarioKind::UpgradeLevel));
        assert_eq!(rec.recommended_incremental_gain_vs_current, 96.82);
        assert!(rec.next_steps.iter().any(|s| s.contains("GIRO")));
    }

    #[test]
    fn test_level_one_without_giro_jumps_to_level_three() {
        let (_, sims, rec) = run_one(customer(120_000.0, 1_400.0, 700.0, 0));
        assert_eq!(sims[0].new_level, Some(Level::Level3));
        assert_eq!(sims[0].interest.total_interest_month, 210.19);
        assert_eq!(sims[0].incremental_gain_vs_current, 166.89);
        assert!(rec.next_steps.iter().any(|s| s.contains("salary")));
    }

    #[test]
    fn test_level_three_at_tier_cap_upgrades_tier() {
        let (current, sims, rec) = run_one(customer(75_000.0, 1_600.0, 700.0, 2));
        assert_eq!(current.interest.total_interest_month, 95.54);
        assert!(!sims[0].applicable);
        assert!(!sims[1].applicable);
        assert_eq!(sims[1].incremental_gain_vs_current, 0.0);

        assert_eq!(sims[2].new_tier, "Tier 2");
        assert_eq!(sims[2].new_avg_balance, 125_000.0);
        assert_eq!(sims[2].interest.total_interest_month, 222.93);
        assert_eq!(sims[2].incremental_gain_vs_current, 127.39);

        assert_eq!(rec.chosen_scenario, Some(ScenarioKind::UpgradeTier));
        assert!(rec.reasoning.contains("Skipped"));
    }

    #[test]
    fn test_top_up_chosen_in_last_tier() {
        let (current, sims, rec) = run_one(customer(127_000.0, 2_000.0, 700.0, 3));
        assert_eq!(current.tier, "Tier 3");
        assert_eq!(sims[1].interest.total_interest_month, 318.47);
        assert_eq!(sims[1].incremental_gain_vs_current, 87.9);
        assert!(!sims[2].applicable);
        assert_eq!(rec.chosen_scenario, Some(ScenarioKind::TopUpToTierCap));
    }

    #[test]
    fn test_nothing_to_improve() {
        let (_, sims, rec) = run_one(customer(200_000.0, 5_000.0, 900.0, 3));
        assert!(sims.iter().all(|s| !s.applicable));
        assert_eq!(rec.chosen_scenario, None);
        assert_eq!(rec.recommended_incremental_gain_vs_current, 0.0);
    }

    #[test]
    fn test_unqualified_card_spend_upgrades_to_level_one() {
        let (_, sims, rec) = run_one(customer(50_000.0, 0.0, 100.0, 0));
        assert_eq!(sims[0].new_level, Some(Level::Level1));
        assert_eq!(sims[0].incremental_gain_vs_current, 25.47);
        assert!(rec.next_steps[0].contains("Spend at least S$500.00"));
    }

    #[test]
    fn test_stash_dropped_balance_recommends_qualifying() {
        let (current, sims, rec) = run_stash(stash(51_000.0, 49_000.0));
        assert!(!current.bonus_eligible);
        assert_eq!(current.tier, "Tier 3");
        assert_eq!(current.interest.total_interest_month, 2.08);

        assert_eq!(sims[0].name, ScenarioKind::QualifyForBonus);
        assert_eq!(sims[0].top_up_amount, 2_000.0);
        assert_eq!(sims[0].interest.total_interest_month, 61.73);
        assert_eq!(sims[0].incremental_gain_vs_current, 59.65);

        // Topping up past last month's balance also restores the bonus
        assert_eq!(sims[1].name, ScenarioKind::TopUpToTierCap);
        assert_eq!(sims[1].new_avg_balance, 70_000.0);
        assert_eq!(sims[1].interest.tiers[1].interest, 39.49);
        assert_eq!(sims[1].interest.tiers[2].interest, 54.78);
        assert_eq!(sims[1].interest.total_interest_month, 97.24);
        assert_eq!(sims[1].incremental_gain_vs_current, 95.16);

        assert_eq!(sims[2].name, ScenarioKind::UpgradeTier);
        assert!(sims[2].interest.bonus_interest_month > 0.0);
        assert!(sims[2].incremental_gain_vs_current > sims[1].incremental_gain_vs_current);

        assert_eq!(rec.chosen_scenario, Some(ScenarioKind::QualifyForBonus));
        assert!(rec.next_steps[0].contains("S$2,000.00"));
    }

    #[test]
    fn test_stash_at_cap_upgrades_tier() {
        let (current, sims, rec) = run_stash(stash(60_000.0, 70_000.0));
        assert_eq!(current.interest.total_interest_month, 97.24);
        assert!(!sims[0].applicable);
        assert!(!sims[1].applicable);
        assert_eq!(sims[2].new_tier, "Tier 4");
        assert_eq!(sims[2].interest.total_interest_month, 172.4);
        assert_eq!(rec.chosen_scenario, Some(ScenarioKind::UpgradeTier));
        assert_eq!(rec.recommended_incremental_gain_vs_current, 75.16);
    }

    #[test]
    fn test_recommendations_never_lower_balance_or_level() {
        for balance in [0.0, 10_000.0, 74_999.0, 130_000.0, 180_000.0] {
            for (salary, card, giro) in [(0.0, 0.0, 0), (0.0, 600.0, 1), (0.0, 600.0, 3), (2_000.0, 600.0, 0)] {
                let (current, sims, _) = run_one(customer(balance, salary, card, giro));
                for sim in &sims {
                    assert!(sim.new_avg_balance >= current.avg_balance);
                    assert!(sim.new_level >= current.level);
                    assert!(sim.top_up_amount >= 0.0);
                }
            }
        }
    }
}
