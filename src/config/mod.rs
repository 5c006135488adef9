//! Plan configuration and the stop-loss / line-item transforms that use it
//!
//! A `Configuration` is an immutable snapshot for one reporting run.

mod line_items;
mod stop_loss;

pub use line_items::{
    evaluate_line_items, ClaimField, CostBasis, LineItem, LineItemResult, LineItemSource,
    MonthAmount,
};
pub use stop_loss::{apply_configuration, ProcessedClaim};

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::normalize::{parse_month, CellValue};

/// Specific stop-loss deductible applied when the plan does not set one
pub const DEFAULT_STOP_LOSS_THRESHOLD: f64 = 100_000.0;

/// Share of the excess reimbursed when the plan does not set one
pub const DEFAULT_REIMBURSEMENT_RATE: f64 = 0.90;

/// Budget inputs for variance and PEPM reporting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Budgeted cost per employee per month
    pub pepm_budget: Option<f64>,
    /// Per-month PEPM overrides keyed by `YYYY-MM`
    pub monthly_pepm_budget: BTreeMap<String, f64>,
    /// Fixed fees keyed by `YYYY-MM`, reported alongside loss ratios
    pub fees_by_month: BTreeMap<String, f64>,
}

impl BudgetConfig {
    /// PEPM budget rate for a month (override, else plan rate, else 0)
    pub fn pepm_rate_for(&self, month: &str) -> f64 {
        self.monthly_pepm_budget
            .get(month)
            .copied()
            .or(self.pepm_budget)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub stop_loss_threshold: Option<f64>,
    /// Fraction in [0, 1]; out-of-range values are clamped when read
    pub stop_loss_reimbursement_rate: Option<f64>,
    pub member_count: u32,
    pub budgets: BudgetConfig,
    pub line_items: Vec<LineItem>,
    /// Active months for line items; defaults to the months present in the claims
    pub months: Option<Vec<String>>,
}

impl Configuration {
    pub fn stop_loss_threshold(&self) -> f64 {
        self.stop_loss_threshold.unwrap_or(DEFAULT_STOP_LOSS_THRESHOLD)
    }

    pub fn reimbursement_rate(&self) -> f64 {
        self.stop_loss_reimbursement_rate
            .unwrap_or(DEFAULT_REIMBURSEMENT_RATE)
            .clamp(0.0, 1.0)
    }

    /// Reject values no run could use
    pub fn validate(&self) -> Result<()> {
        let threshold = self.stop_loss_threshold();
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(EngineError::Config(format!(
                "stop_loss_threshold must be a non-negative number, got {}",
                threshold
            )));
        }
        if let Some(rate) = self.stop_loss_reimbursement_rate {
            if !rate.is_finite() {
                return Err(EngineError::Config(format!(
                    "stop_loss_reimbursement_rate must be finite, got {}",
                    rate
                )));
            }
        }
        if let Some(months) = &self.months {
            for m in months {
                if parse_month(&CellValue::Text(m.clone())).is_none() {
                    return Err(EngineError::Config(format!("unrecognized month '{}'", m)));
                }
            }
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Months used for line-item evaluation, chronological
    ///
    /// Configured months win; otherwise the distinct claim months.
    pub fn active_months(&self, claims: &[ProcessedClaim]) -> Vec<String> {
        match &self.months {
            Some(months) => {
                let mut months = months.clone();
                months.sort();
                months.dedup();
                months
            }
            None => claims
                .iter()
                .map(|c| c.claim.month_key.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        }
    }
}
