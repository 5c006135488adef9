//! Per-claim stop-loss derivation
//!
//! Excess over the specific deductible is reimbursed at the configured rate:
//! `excess = max(0, total - threshold)`, `reimbursement = excess * rate`,
//! `net_paid = total - reimbursement`. Nothing else mutates these fields.

use serde::{Deserialize, Serialize};

use super::Configuration;
use crate::normalize::NormalizedClaim;

/// A normalized claim with its stop-loss fields applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedClaim {
    #[serde(flatten)]
    pub claim: NormalizedClaim,
    pub stop_loss_triggered: bool,
    pub stop_loss_excess: f64,
    pub stop_loss_reimbursement: f64,
    pub net_paid: f64,
}

impl ProcessedClaim {
    /// Derive stop-loss fields for one claim
    pub fn from_claim(claim: NormalizedClaim, threshold: f64, reimbursement_rate: f64) -> Self {
        let stop_loss_excess = (claim.total_amount - threshold).max(0.0);
        let stop_loss_reimbursement = stop_loss_excess * reimbursement_rate;
        let net_paid = claim.total_amount - stop_loss_reimbursement;

        Self {
            claim,
            stop_loss_triggered: stop_loss_excess > 0.0,
            stop_loss_excess,
            stop_loss_reimbursement,
            net_paid,
        }
    }
}

/// Apply plan configuration to every claim; order-independent and side-effect free
pub fn apply_configuration(claims: &[NormalizedClaim], config: &Configuration) -> Vec<ProcessedClaim> {
    let threshold = config.stop_loss_threshold();
    let rate = config.reimbursement_rate();

    let processed: Vec<ProcessedClaim> = claims
        .iter()
        .cloned()
        .map(|c| ProcessedClaim::from_claim(c, threshold, rate))
        .collect();

    log::debug!(
        "applied stop-loss (threshold={}, rate={}) to {} claims, {} triggered",
        threshold,
        rate,
        processed.len(),
        processed.iter().filter(|c| c.stop_loss_triggered).count()
    );
    processed
}
