//! Monthly loss-ratio summaries from cost-category experience

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::normalize::ExperienceRow;
use crate::schema::categories::{contains_keyword, CLAIMS_KEYWORDS, PREMIUM_KEYWORDS};

/// Months in the trailing loss-ratio window
pub const ROLLING_WINDOW: usize = 12;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// `YYYY-MM`
    pub month: String,
    pub claims: f64,
    pub premium: f64,
    pub fees: f64,
    /// claims / premium; `None` when premium is not positive
    pub loss_ratio: Option<f64>,
    /// (claims + fees) / premium; `None` when premium is not positive
    pub combined_ratio: Option<f64>,
    /// Trailing twelve-month loss ratio; `None` for the first eleven months
    pub rolling_12_loss_ratio: Option<f64>,
}

/// Claims and premium dollars a single row contributes
///
/// Each side prefers its explicit column; without one, the category label
/// decides. A label matching both keyword sets counts as claims.
fn split_row(row: &ExperienceRow) -> (f64, f64) {
    let (claims_by_label, premium_by_label) = if contains_keyword(&row.category, CLAIMS_KEYWORDS) {
        (row.amount, 0.0)
    } else if contains_keyword(&row.category, PREMIUM_KEYWORDS) {
        (0.0, row.amount)
    } else {
        (0.0, 0.0)
    };
    (
        row.claims.unwrap_or(claims_by_label),
        row.premium.unwrap_or(premium_by_label),
    )
}

fn positive_ratio(numerator: f64, premium: f64) -> Option<f64> {
    (premium > 0.0).then(|| numerator / premium)
}

/// Per-month claims, premium, fees and loss ratios in calendar order
pub fn compute_monthly_summaries(
    experience: &[ExperienceRow],
    fees_by_month: &BTreeMap<String, f64>,
) -> Vec<MonthlySummary> {
    let mut months: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for row in experience {
        let (claims, premium) = split_row(row);
        let entry = months.entry(row.month.as_str()).or_insert((0.0, 0.0));
        entry.0 += claims;
        entry.1 += premium;
    }

    let mut summaries: Vec<MonthlySummary> = months
        .into_iter()
        .map(|(month, (claims, premium))| {
            let fees = fees_by_month.get(month).copied().unwrap_or(0.0);
            MonthlySummary {
                month: month.to_string(),
                claims,
                premium,
                fees,
                loss_ratio: positive_ratio(claims, premium),
                combined_ratio: positive_ratio(claims + fees, premium),
                rolling_12_loss_ratio: None,
            }
        })
        .collect();

    // Window positions follow the reported sequence, not calendar gaps
    for i in (ROLLING_WINDOW - 1)..summaries.len() {
        let window = &summaries[i + 1 - ROLLING_WINDOW..=i];
        let claims: f64 = window.iter().map(|s| s.claims).sum();
        let premium: f64 = window.iter().map(|s| s.premium).sum();
        summaries[i].rolling_12_loss_ratio = positive_ratio(claims, premium);
    }

    log::debug!("computed {} monthly summaries", summaries.len());
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(month: &str, category: &str, amount: f64) -> ExperienceRow {
        ExperienceRow {
            month: month.to_string(),
            category: category.to_string(),
            amount,
            employee_count: None,
            member_count: None,
            claims: None,
            premium: None,
        }
    }

    fn year_of_months(n: usize) -> Vec<ExperienceRow> {
        (0..n)
            .flat_map(|i| {
                let month = format!("{}-{:02}", 2023 + i / 12, i % 12 + 1);
                vec![
                    row(&month, "Medical Claims", 800.0),
                    row(&month, "Premium", 1_000.0),
                ]
            })
            .collect()
    }

    #[test]
    fn test_zero_premium_loss_ratio_is_undefined() {
        let rows = vec![row("2024-01", "Medical Claims", 500.0), row("2024-01", "Premium", 0.0)];
        let s = &compute_monthly_summaries(&rows, &BTreeMap::new())[0];
        assert_eq!(s.claims, 500.0);
        assert_eq!(s.loss_ratio, None);
        assert_eq!(s.combined_ratio, None);
    }

    #[test]
    fn test_explicit_columns_preferred_over_keywords() {
        let mut r = row("2024-01", "Monthly Totals", 999.0);
        r.claims = Some(700.0);
        r.premium = Some(1_000.0);
        let s = &compute_monthly_summaries(&[r], &BTreeMap::new())[0];
        assert_eq!(s.claims, 700.0);
        assert_eq!(s.premium, 1_000.0);
        assert_relative_eq!(s.loss_ratio.unwrap(), 0.7);
    }

    #[test]
    fn test_each_side_falls_back_to_label_independently() {
        let mut r = row("2024-01", "Medical Claims", 500.0);
        r.premium = Some(1_000.0);
        let s = &compute_monthly_summaries(&[r], &BTreeMap::new())[0];
        assert_eq!(s.claims, 500.0);
        assert_eq!(s.premium, 1_000.0);
        assert_relative_eq!(s.loss_ratio.unwrap(), 0.5);

        let mut r = row("2024-01", "Premium", 2_000.0);
        r.claims = Some(300.0);
        let s = &compute_monthly_summaries(&[r], &BTreeMap::new())[0];
        assert_eq!(s.claims, 300.0);
        assert_eq!(s.premium, 2_000.0);
    }

    #[test]
    fn test_fees_feed_combined_ratio() {
        let fees: BTreeMap<String, f64> = [("2024-01".to_string(), 100.0)].into_iter().collect();
        let rows = vec![
            row("2024-01", "Rx Claims", 600.0),
            row("2024-01", "Employer Contributions", 1_000.0),
            row("2024-01", "Admin Fees", 50.0),
        ];
        let s = &compute_monthly_summaries(&rows, &fees)[0];
        assert_eq!(s.fees, 100.0);
        assert_relative_eq!(s.loss_ratio.unwrap(), 0.6);
        assert_relative_eq!(s.combined_ratio.unwrap(), 0.7);
    }

    #[test]
    fn test_rolling_twelve_starts_at_twelfth_month() {
        let summaries = compute_monthly_summaries(&year_of_months(14), &BTreeMap::new());
        assert_eq!(summaries.len(), 14);
        for s in &summaries[..11] {
            assert_eq!(s.rolling_12_loss_ratio, None, "{}", s.month);
        }
        for s in &summaries[11..] {
            assert_relative_eq!(s.rolling_12_loss_ratio.unwrap(), 0.8);
        }
    }

    #[test]
    fn test_rolling_window_slides() {
        let mut rows = year_of_months(13);
        // Month 13 doubles its claims; month 1 drops out of the window
        rows.push(row("2024-01", "Large Claim", 800.0));
        let summaries = compute_monthly_summaries(&rows, &BTreeMap::new());
        let expected = (11.0 * 800.0 + 1_600.0) / 12_000.0;
        assert_relative_eq!(summaries[12].rolling_12_loss_ratio.unwrap(), expected);
    }
}
