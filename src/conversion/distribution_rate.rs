//! Effective future distribution tax rate (t_D) of a conversion slice
//!
//! Converting `A` moves `A` from the Traditional to the Roth balance. Both
//! are drawn down with the same annuity factor, so total distributions are
//! unchanged while taxable distributions fall by `A × af` every year. The
//! tax saved across the horizon, divided by the Traditional distributions
//! removed (`A × M`), is the rate the slice would have been taxed at.
//!
//! The rate can exceed the bracket rate in the Social Security taxation
//! zone: lower Traditional distributions keep more of the benefit untaxed,
//! so each removed dollar also removes up to 0.85 dollars of taxable benefit.

use serde::{Deserialize, Serialize};

use crate::projection::RetirementProjection;

/// Year-by-year effect of removing one slice of the Traditional balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionTaxEstimate {
    /// Tax saved divided by Traditional distributions removed (t_D)
    pub distribution_tax_rate: f64,
    /// Total federal tax saved over the horizon
    pub tax_saved: f64,
    /// Traditional distributions removed over the horizon
    pub distributions_removed: f64,
    /// Increase in after-tax distributions for years 1..=n
    pub payout_stream: Vec<f64>,
    /// Payout-weighted mean year of the stream
    pub duration_years: f64,
    pub dist_mtr_pre: f64,
    pub dist_mtr_post: f64,
}

/// Amount-weighted mean of years 1..=n; 0 when the stream sums to 0
pub fn payout_duration(stream: &[f64]) -> f64 {
    let total: f64 = stream.iter().sum();
    if total.abs() < f64::EPSILON {
        return 0.0;
    }
    let weighted: f64 = stream
        .iter()
        .enumerate()
        .map(|(i, amount)| (i + 1) as f64 * amount)
        .sum();
    weighted / total
}

/// Compares projections before and after a slice is converted
#[derive(Debug, Clone, Copy, Default)]
pub struct DistributionTaxRateEstimator;

impl DistributionTaxRateEstimator {
    pub fn new() -> Self {
        Self
    }

    /// `before` holds the larger Traditional balance; both projections must
    /// share a profile and horizon
    pub fn estimate(&self, before: &RetirementProjection, after: &RetirementProjection) -> DistributionTaxEstimate {
        let years = before.records.iter().zip(&after.records);

        let mut tax_saved = 0.0;
        let mut distributions_removed = 0.0;
        let mut payout_stream = Vec::with_capacity(before.records.len());

        for (pre, post) in years {
            tax_saved += pre.federal_tax - post.federal_tax;
            distributions_removed += pre.trad_distribution - post.trad_distribution;
            payout_stream.push(post.after_tax_distribution - pre.after_tax_distribution);
        }

        let distribution_tax_rate = if distributions_removed.abs() > f64::EPSILON {
            tax_saved / distributions_removed
        } else {
            0.0
        };

        DistributionTaxEstimate {
            distribution_tax_rate,
            tax_saved,
            distributions_removed,
            duration_years: payout_duration(&payout_stream),
            payout_stream,
            dist_mtr_pre: before.average_adjusted_marginal_rate(),
            dist_mtr_post: after.average_adjusted_marginal_rate(),
        }
    }
}
