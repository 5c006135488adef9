//! Custom budget line items evaluated per month
//!
//! An item's annual total is always the sum of its monthly amounts, so the
//! monthly and annual views cannot disagree.

use serde::{Deserialize, Serialize};

use super::stop_loss::ProcessedClaim;

/// Numeric claim field a claims-sourced line item sums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimField {
    MedicalAmount,
    PharmacyAmount,
    TotalAmount,
    StopLossExcess,
    StopLossReimbursement,
    NetPaid,
}

impl ClaimField {
    pub fn value(&self, claim: &ProcessedClaim) -> f64 {
        match self {
            ClaimField::MedicalAmount => claim.claim.medical_amount,
            ClaimField::PharmacyAmount => claim.claim.pharmacy_amount,
            ClaimField::TotalAmount => claim.claim.total_amount,
            ClaimField::StopLossExcess => claim.stop_loss_excess,
            ClaimField::StopLossReimbursement => claim.stop_loss_reimbursement,
            ClaimField::NetPaid => claim.net_paid,
        }
    }
}

/// How a fixed amount spreads over months
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostBasis {
    /// Amount charged every month as-is
    Monthly,
    /// Amount split evenly across the active months
    Annual,
    /// Amount per employee per month, times member count
    Pepm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum LineItemSource {
    Claims {
        field: ClaimField,
        #[serde(default)]
        service_type: Option<String>,
    },
    Fixed {
        amount: f64,
        basis: CostBasis,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub source: LineItemSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthAmount {
    pub month: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemResult {
    pub id: String,
    pub label: String,
    pub monthly: Vec<MonthAmount>,
    pub annual_total: f64,
}

fn same_service(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl LineItem {
    /// Amount for one month given the claims and the count of active months
    fn amount_for(&self, month: &str, claims: &[ProcessedClaim], active_months: usize, member_count: u32) -> f64 {
        match &self.source {
            LineItemSource::Claims { field, service_type } => claims
                .iter()
                .filter(|c| c.claim.month_key == month)
                .filter(|c| {
                    service_type
                        .as_deref()
                        .map_or(true, |s| same_service(s, &c.claim.service_type))
                })
                .map(|c| field.value(c))
                .sum(),
            LineItemSource::Fixed { amount, basis } => match basis {
                CostBasis::Monthly => *amount,
                CostBasis::Annual => *amount / active_months as f64,
                CostBasis::Pepm => *amount * member_count as f64,
            },
        }
    }
}

/// Evaluate every line item over `months` (chronological `YYYY-MM` keys)
pub fn evaluate_line_items(
    items: &[LineItem],
    claims: &[ProcessedClaim],
    months: &[String],
    member_count: u32,
) -> Vec<LineItemResult> {
    items
        .iter()
        .map(|item| {
            let monthly: Vec<MonthAmount> = months
                .iter()
                .map(|m| MonthAmount {
                    month: m.clone(),
                    amount: item.amount_for(m, claims, months.len(), member_count),
                })
                .collect();
            let annual_total = monthly.iter().map(|m| m.amount).sum();

            LineItemResult {
                id: item.id.clone(),
                label: item.label.clone(),
                monthly,
                annual_total,
            }
        })
        .collect()
}
