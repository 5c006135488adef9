//! Aggregation of processed claims and cost-category experience
//!
//! Everything here is recomputed wholesale from its inputs; nothing is
//! patched incrementally.

mod financial;
mod metrics;
mod summary;

pub use financial::{compute_financial_metrics, FinancialMetrics};
pub use metrics::{aggregate_metrics, AggregatedMetrics, MetricsAccumulator, MonthBucket, ServiceBucket};
pub use summary::{compute_monthly_summaries, MonthlySummary, ROLLING_WINDOW};
