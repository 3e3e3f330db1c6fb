use crate::error::{AdvisorError, Result};
use crate::schema::{InterestBreakdown, InterestReport};

pub struct ReportAuditor<'a> {
    report: &'a InterestReport,
}

impl<'a> ReportAuditor<'a> {
    pub fn new(report: &'a InterestReport) -> Self {
        Self { report }
    }

    /// Checks the arithmetic invariants of a report: breakdowns add up,
    /// gains match totals, nothing recommends a lower balance, and the
    /// chosen scenario is the first with a positive gain.
    pub fn verify(&self, tolerance: f64) -> Result<()> {
        self.verify_breakdown("current", &self.report.current.interest, tolerance)?;

        let current_total = self.report.current.interest.total_interest_month;
        for sim in &self.report.simulations {
            let label = sim.name.to_string();
            self.verify_breakdown(&label, &sim.interest, tolerance)?;

            if sim.applicable {
                let expected = sim.interest.total_interest_month - current_total;
                if (expected - sim.incremental_gain_vs_current).abs() > tolerance {
                    return Err(self.inconsistent(format!(
                        "{} gain {} does not equal {} - {}",
                        label, sim.incremental_gain_vs_current, sim.interest.total_interest_month, current_total
                    )));
                }
            } else if sim.incremental_gain_vs_current != 0.0 {
                return Err(self.inconsistent(format!("{} is not applicable but reports a gain", label)));
            }

            if sim.new_avg_balance + tolerance < self.report.current.avg_balance {
                return Err(self.inconsistent(format!(
                    "{} lowers the balance from {} to {}",
                    label, self.report.current.avg_balance, sim.new_avg_balance
                )));
            }
            if sim.new_level < self.report.current.level {
                return Err(self.inconsistent(format!("{} lowers the level", label)));
            }
        }

        let expected_choice = self
            .report
            .simulations
            .iter()
            .find(|s| s.applicable && s.incremental_gain_vs_current > 0.0)
            .map(|s| s.name);
        if expected_choice != self.report.recommended_action.chosen_scenario {
            return Err(self.inconsistent(format!(
                "chosen scenario {:?} is not the first positive gain {:?}",
                self.report.recommended_action.chosen_scenario, expected_choice
            )));
        }

        Ok(())
    }

    fn verify_breakdown(&self, label: &str, breakdown: &InterestBreakdown, tolerance: f64) -> Result<()> {
        let tiers: f64 = breakdown.tiers.iter().map(|t| t.interest).sum();
        if (tiers - breakdown.bonus_interest_month).abs() > tolerance {
            return Err(self.inconsistent(format!(
                "{}: tier interest {} != bonus {}",
                label, tiers, breakdown.bonus_interest_month
            )));
        }

        let total = breakdown.base_interest_month + breakdown.bonus_interest_month;
        if (total - breakdown.total_interest_month).abs() > tolerance {
            return Err(self.inconsistent(format!(
                "{}: base {} + bonus {} != total {}",
                label, breakdown.base_interest_month, breakdown.bonus_interest_month, breakdown.total_interest_month
            )));
        }

        Ok(())
    }

    fn inconsistent(&self, details: String) -> AdvisorError {
        AdvisorError::InconsistentReport {
            customer_id: self.report.customer_id.clone(),
            details,
        }
    }
}

pub fn verify_report(report: &InterestReport, tolerance: f64) -> Result<()> {
    ReportAuditor::new(report).verify(tolerance)
}
