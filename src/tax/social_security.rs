//! Taxation of Social Security benefits (IRS Publication 915 worksheet)
//!
//! Provisional income is other ordinary income plus half the benefit. Below
//! the base amount nothing is taxable; between the base and adjusted base
//! amounts half of the excess is taxable; above the adjusted base amount 85%
//! of the excess is added to the capped first tier. The taxable amount never
//! exceeds 85% of the benefit.
//!
//! While the cap is not binding, each extra dollar of ordinary income also
//! pulls 0.50 or 0.85 dollars of benefit into taxable income. That inclusion
//! rate is reported so callers can inflate the nominal marginal rate.

use serde::{Deserialize, Serialize};

use super::tables::SsThresholds;

/// Maximum share of the benefit that can become taxable
pub const MAX_TAXABLE_FRACTION: f64 = 0.85;

/// Share of excess provisional income taxed between the two thresholds
pub const FIRST_TIER_RATE: f64 = 0.50;

/// Share of excess provisional income taxed above the adjusted base amount
pub const SECOND_TIER_RATE: f64 = 0.85;

/// Outcome of applying the worksheet to one year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SocialSecurityTaxation {
    pub provisional_income: f64,
    /// Dollars of benefit included in taxable income
    pub taxable_amount: f64,
    /// `taxable_amount / benefit` (0 when there is no benefit)
    pub taxable_fraction: f64,
    /// Extra dollars of benefit made taxable per extra dollar of other income
    pub marginal_inclusion: f64,
}

impl SocialSecurityTaxation {
    /// Multiplier on the nominal marginal rate: 1.0, 1.5 or 1.85
    pub fn rate_multiplier(&self) -> f64 {
        1.0 + self.marginal_inclusion
    }

    /// Nominal bracket rate adjusted for benefit inclusion
    pub fn adjusted_marginal_rate(&self, nominal_rate: f64) -> f64 {
        nominal_rate * self.rate_multiplier()
    }

    fn untaxed(provisional_income: f64) -> Self {
        Self {
            provisional_income,
            taxable_amount: 0.0,
            taxable_fraction: 0.0,
            marginal_inclusion: 0.0,
        }
    }
}

/// Threshold rule for one filing status
#[derive(Debug, Clone, Copy)]
pub struct SocialSecurityTaxRule {
    thresholds: SsThresholds,
}

impl SocialSecurityTaxRule {
    pub fn new(thresholds: SsThresholds) -> Self {
        Self { thresholds }
    }

    /// Taxable portion of `benefit` given the year's other ordinary income
    pub fn evaluate(&self, benefit: f64, other_income: f64) -> SocialSecurityTaxation {
        let provisional_income = other_income + 0.5 * benefit;
        if benefit <= 0.0 {
            return SocialSecurityTaxation::untaxed(provisional_income);
        }

        let base = self.thresholds.base_amount;
        let adjusted = self.thresholds.adjusted_base_amount;

        if provisional_income <= base {
            return SocialSecurityTaxation::untaxed(provisional_income);
        }

        let (uncapped, cap, tier_rate) = if provisional_income <= adjusted {
            (
                FIRST_TIER_RATE * (provisional_income - base),
                FIRST_TIER_RATE * benefit,
                FIRST_TIER_RATE,
            )
        } else {
            let first_tier = (FIRST_TIER_RATE * (adjusted - base)).min(FIRST_TIER_RATE * benefit);
            (
                SECOND_TIER_RATE * (provisional_income - adjusted) + first_tier,
                MAX_TAXABLE_FRACTION * benefit,
                SECOND_TIER_RATE,
            )
        };

        let (taxable_amount, marginal_inclusion) = if uncapped < cap {
            (uncapped, tier_rate)
        } else {
            (cap, 0.0)
        };

        SocialSecurityTaxation {
            provisional_income,
            taxable_amount,
            taxable_fraction: taxable_amount / benefit,
            marginal_inclusion,
        }
    }
}
