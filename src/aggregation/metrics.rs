//! Claims-level metrics over processed claims
//!
//! One fold over the claims into `MetricsAccumulator`, then a single
//! conversion into the read-only `AggregatedMetrics` shape.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::ProcessedClaim;

/// Per-month totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthBucket {
    /// `YYYY-MM`
    pub month: String,
    pub claim_count: usize,
    pub medical: f64,
    pub pharmacy: f64,
    pub total: f64,
    pub stop_loss_reimbursement: f64,
    pub net_paid: f64,
}

/// Per-service-type totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceBucket {
    pub service_type: String,
    pub claim_count: usize,
    pub total: f64,
    /// Fraction of total spend; `None` when total spend is zero
    pub share: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMetrics {
    pub claim_count: usize,
    pub claimant_count: usize,
    pub total_medical: f64,
    pub total_pharmacy: f64,
    pub total_claims: f64,
    pub total_stop_loss_excess: f64,
    pub total_stop_loss_reimbursement: f64,
    pub total_net_paid: f64,
    /// Claims whose total exceeded the stop-loss threshold
    pub claims_over_threshold: usize,
    /// `None` when there are no claims
    pub average_claim: Option<f64>,
    /// Chronological
    pub month_sequence: Vec<MonthBucket>,
    /// Descending by total
    pub service_distribution: Vec<ServiceBucket>,
}

/// Running state for the aggregation fold
#[derive(Debug, Default)]
pub struct MetricsAccumulator {
    claim_count: usize,
    claimants: HashSet<String>,
    total_medical: f64,
    total_pharmacy: f64,
    total_claims: f64,
    total_excess: f64,
    total_reimbursement: f64,
    total_net_paid: f64,
    over_threshold: usize,
    months: BTreeMap<String, MonthBucket>,
    services: HashMap<String, ServiceBucket>,
}

impl MetricsAccumulator {
    pub fn add(mut self, claim: &ProcessedClaim) -> Self {
        let c = &claim.claim;

        self.claim_count += 1;
        if !c.claimant_id.is_empty() {
            self.claimants.insert(c.claimant_id.clone());
        }
        self.total_medical += c.medical_amount;
        self.total_pharmacy += c.pharmacy_amount;
        self.total_claims += c.total_amount;
        self.total_excess += claim.stop_loss_excess;
        self.total_reimbursement += claim.stop_loss_reimbursement;
        self.total_net_paid += claim.net_paid;
        if claim.stop_loss_triggered {
            self.over_threshold += 1;
        }

        let month = self
            .months
            .entry(c.month_key.clone())
            .or_insert_with(|| MonthBucket {
                month: c.month_key.clone(),
                ..Default::default()
            });
        month.claim_count += 1;
        month.medical += c.medical_amount;
        month.pharmacy += c.pharmacy_amount;
        month.total += c.total_amount;
        month.stop_loss_reimbursement += claim.stop_loss_reimbursement;
        month.net_paid += claim.net_paid;

        let service = self
            .services
            .entry(c.service_type.clone())
            .or_insert_with(|| ServiceBucket {
                service_type: c.service_type.clone(),
                ..Default::default()
            });
        service.claim_count += 1;
        service.total += c.total_amount;

        self
    }

    pub fn finish(self) -> AggregatedMetrics {
        let total = self.total_claims;

        let mut service_distribution: Vec<ServiceBucket> = self
            .services
            .into_values()
            .map(|mut s| {
                s.share = (total != 0.0).then(|| s.total / total);
                s
            })
            .collect();
        service_distribution.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then_with(|| a.service_type.cmp(&b.service_type))
        });

        AggregatedMetrics {
            claim_count: self.claim_count,
            claimant_count: self.claimants.len(),
            total_medical: self.total_medical,
            total_pharmacy: self.total_pharmacy,
            total_claims: total,
            total_stop_loss_excess: self.total_excess,
            total_stop_loss_reimbursement: self.total_reimbursement,
            total_net_paid: self.total_net_paid,
            claims_over_threshold: self.over_threshold,
            average_claim: (self.claim_count > 0).then(|| total / self.claim_count as f64),
            // BTreeMap over `YYYY-MM` keys iterates in calendar order
            month_sequence: self.months.into_values().collect(),
            service_distribution,
        }
    }
}

/// Aggregate processed claims into totals, a month sequence and a service distribution
pub fn aggregate_metrics(claims: &[ProcessedClaim]) -> AggregatedMetrics {
    let metrics = claims
        .iter()
        .fold(MetricsAccumulator::default(), MetricsAccumulator::add)
        .finish();

    log::debug!(
        "aggregated {} claims over {} months, {} service types",
        metrics.claim_count,
        metrics.month_sequence.len(),
        metrics.service_distribution.len()
    );
    metrics
}
