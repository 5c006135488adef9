//! Monthly financial roll-up of cost-category experience
//!
//! First pass resolves category aliases into canonical lines per month.
//! Second pass walks the months in calendar order carrying cumulative
//! actuals, budget and employee-months.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::BudgetConfig;
use crate::normalize::ExperienceRow;
use crate::schema::categories::{
    category_key, CategoryAliases, ADMIN_FEE_CATEGORIES, DOMESTIC_HOSPITAL, EBA_PAID,
    NON_DOMESTIC_HOSPITAL, NON_HOSPITAL, RUN_OUT, RX_CLAIMS, RX_REBATES,
    STOP_LOSS_REIMBURSEMENT, TOTAL_HOSPITAL, UC_SETTLEMENT,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    /// `YYYY-MM`
    pub month: String,
    pub domestic_hospital: f64,
    pub non_domestic_hospital: f64,
    pub total_hospital: f64,
    pub non_hospital: f64,
    pub total_all_medical: f64,
    pub uc_settlement: f64,
    pub total_adjusted_medical: f64,
    pub run_out: Option<f64>,
    pub eba_paid: Option<f64>,
    pub total_medical: f64,
    pub total_rx: f64,
    pub rx_rebates: f64,
    pub stop_loss_reimbursement: f64,
    pub total_admin: f64,
    pub monthly_total: f64,
    pub employee_count: f64,
    pub monthly_budget: f64,
    pub cumulative_total: f64,
    pub cumulative_budget: f64,
    pub monthly_variance: f64,
    pub cumulative_variance: f64,
    /// `None` when the month's budget is zero
    pub monthly_variance_pct: Option<f64>,
    /// `None` when the cumulative budget is zero
    pub cumulative_variance_pct: Option<f64>,
    /// `None` when the month has no employees
    pub pepm_actual: Option<f64>,
    /// `None` until some month has employees
    pub pepm_cumulative: Option<f64>,
}

/// One month's category amounts keyed by `category_key`
#[derive(Debug, Default)]
struct MonthLines {
    amounts: HashMap<String, f64>,
    employee_count: f64,
}

impl MonthLines {
    /// Amount for the first alias label present this month
    fn resolve(&self, aliases: &CategoryAliases) -> Option<f64> {
        aliases
            .labels
            .iter()
            .find_map(|label| self.amounts.get(&category_key(label)).copied())
    }

    fn amount(&self, aliases: &CategoryAliases) -> f64 {
        self.resolve(aliases).unwrap_or(0.0)
    }
}

fn group_by_month(rows: &[ExperienceRow]) -> BTreeMap<String, MonthLines> {
    let mut months: BTreeMap<String, MonthLines> = BTreeMap::new();
    for row in rows {
        let lines = months.entry(row.month.clone()).or_default();
        *lines.amounts.entry(category_key(&row.category)).or_insert(0.0) += row.amount;
        if let Some(count) = row.employee_count {
            lines.employee_count = lines.employee_count.max(count);
        }
    }
    months
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator != 0.0).then(|| numerator / denominator)
}

fn first_pass(month: &str, lines: &MonthLines, budgets: &BudgetConfig) -> FinancialMetrics {
    let domestic_hospital = lines.amount(&DOMESTIC_HOSPITAL);
    let non_domestic_hospital = lines.amount(&NON_DOMESTIC_HOSPITAL);
    let total_hospital = lines
        .resolve(&TOTAL_HOSPITAL)
        .unwrap_or(domestic_hospital + non_domestic_hospital);

    let non_hospital = lines.amount(&NON_HOSPITAL);
    let total_all_medical = total_hospital + non_hospital;

    let uc_settlement = lines.amount(&UC_SETTLEMENT);
    let total_adjusted_medical = total_all_medical + uc_settlement;

    let run_out = lines.resolve(&RUN_OUT);
    let eba_paid = lines.resolve(&EBA_PAID);
    let total_medical =
        total_adjusted_medical + run_out.unwrap_or(0.0) + eba_paid.unwrap_or(0.0);

    let total_rx = lines.amount(&RX_CLAIMS);
    let rx_rebates = lines.amount(&RX_REBATES);
    let stop_loss_reimbursement = lines.amount(&STOP_LOSS_REIMBURSEMENT);
    let total_admin: f64 = ADMIN_FEE_CATEGORIES.iter().map(|c| lines.amount(c)).sum();

    // Rebates and reimbursements are carried as signed amounts, usually negative
    let monthly_total = total_medical + total_rx + total_admin + rx_rebates + stop_loss_reimbursement;

    let employee_count = lines.employee_count;
    let monthly_budget = budgets.pepm_rate_for(month) * employee_count;

    FinancialMetrics {
        month: month.to_string(),
        domestic_hospital,
        non_domestic_hospital,
        total_hospital,
        non_hospital,
        total_all_medical,
        uc_settlement,
        total_adjusted_medical,
        run_out,
        eba_paid,
        total_medical,
        total_rx,
        rx_rebates,
        stop_loss_reimbursement,
        total_admin,
        monthly_total,
        employee_count,
        monthly_budget,
        monthly_variance: monthly_total - monthly_budget,
        monthly_variance_pct: ratio(monthly_total - monthly_budget, monthly_budget),
        pepm_actual: (employee_count > 0.0).then(|| monthly_total / employee_count),
        ..Default::default()
    }
}

/// Financial metrics per calendar month, chronological
pub fn compute_financial_metrics(rows: &[ExperienceRow], budgets: &BudgetConfig) -> Vec<FinancialMetrics> {
    let months = group_by_month(rows);

    let mut metrics: Vec<FinancialMetrics> = months
        .iter()
        .map(|(month, lines)| first_pass(month, lines, budgets))
        .collect();

    let mut cumulative_total = 0.0;
    let mut cumulative_budget = 0.0;
    let mut employee_months = 0.0;
    for m in &mut metrics {
        cumulative_total += m.monthly_total;
        cumulative_budget += m.monthly_budget;
        employee_months += m.employee_count;

        m.cumulative_total = cumulative_total;
        m.cumulative_budget = cumulative_budget;
        m.cumulative_variance = cumulative_total - cumulative_budget;
        m.cumulative_variance_pct = ratio(m.cumulative_variance, cumulative_budget);
        m.pepm_cumulative = (employee_months > 0.0).then(|| cumulative_total / employee_months);
    }

    log::debug!("computed financial metrics for {} months", metrics.len());
    metrics
}
