//! Payoff decomposition and investment metrics per conversion segment
//!
//! With the conversion tax paid from outside savings, the payoff of a
//! segment splits into two parts:
//! - synthetic Roth contribution: the tax payment itself, compounded
//!   tax-free over the distribution horizon (`tax × M`)
//! - tax-rate spread: `(t_D - t_C) × A × M`, positive when the avoided
//!   distribution tax exceeds the tax paid at conversion

use super::distribution_rate::DistributionTaxEstimate;
use super::irr::{calculate_irr, IrrSolution};
use super::segment::{ConversionSegment, SegmentKind};

/// Return multiple reported when no conversion tax is paid
pub const ZERO_TAX_RETURN_MULTIPLE: f64 = 100.0;

/// IRR reported when no conversion tax is paid (100%)
pub const ZERO_TAX_IRR: f64 = 1.0;

/// Taxes below this are treated as zero
const ZERO_TAX_EPSILON: f64 = 1e-6;

/// Amount and tax of one conversion segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentInput {
    pub kind: SegmentKind,
    pub group_num: u32,
    pub bracket_rate: f64,
    pub amount: f64,
    pub tax: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ConversionEconomicsCalculator {
    annuity_factor_multiple: f64,
}

impl ConversionEconomicsCalculator {
    pub fn new(annuity_factor_multiple: f64) -> Self {
        Self {
            annuity_factor_multiple,
        }
    }

    pub fn calculate(&self, input: SegmentInput, estimate: &DistributionTaxEstimate) -> ConversionSegment {
        let m = self.annuity_factor_multiple;
        let amount = input.amount;
        let conversion_tax = input.tax;
        let zero_tax = conversion_tax.abs() < ZERO_TAX_EPSILON;

        let conv_tax_rate = if amount > 0.0 { conversion_tax / amount } else { 0.0 };
        let t_d = estimate.distribution_tax_rate;

        let synthetic_roth_contribution = conversion_tax * m;
        let tax_rate_spread_amount = (t_d - conv_tax_rate) * amount * m;
        let total_after_tax_payout = synthetic_roth_contribution + tax_rate_spread_amount;

        let (return_multiple, irr) = if zero_tax {
            (ZERO_TAX_RETURN_MULTIPLE, IrrSolution::Converged(ZERO_TAX_IRR))
        } else {
            let mut cashflows = Vec::with_capacity(estimate.payout_stream.len() + 1);
            cashflows.push(-conversion_tax);
            cashflows.extend_from_slice(&estimate.payout_stream);

            let irr = calculate_irr(&cashflows);
            if !irr.is_converged() {
                log::warn!(
                    "IRR did not converge for {:?} group {} (tax {:.2}, payout {:.2})",
                    input.kind,
                    input.group_num,
                    conversion_tax,
                    total_after_tax_payout
                );
            }
            (total_after_tax_payout / conversion_tax, irr)
        };

        ConversionSegment {
            kind: input.kind,
            group_num: input.group_num,
            tax_bracket_rate: input.bracket_rate,
            conversion_amount: amount,
            conversion_tax,
            conv_tax_rate,
            distribution_tax_rate: t_d,
            synthetic_roth_contribution,
            tax_rate_spread_amount,
            total_after_tax_payout,
            return_multiple,
            irr,
            duration_years: estimate.duration_years,
            conversion_dist_tax: estimate.tax_saved,
            dist_mtr_pre: estimate.dist_mtr_pre,
            dist_mtr_post: estimate.dist_mtr_post,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::DistributionSchedule;
    use approx::assert_relative_eq;

    fn twelve_percent_part() -> SegmentInput {
        SegmentInput {
            kind: SegmentKind::Isolated,
            group_num: 3,
            bracket_rate: 0.12,
            amount: 73_100.0,
            tax: 8_772.0,
        }
    }

    fn schedule() -> DistributionSchedule {
        DistributionSchedule::calculate(1_000_000.0, 0.05, 30).unwrap()
    }

    #[test]
    fn test_equal_rates() {
        let schedule = schedule();
        let calc = ConversionEconomicsCalculator::new(schedule.annuity_factor_multiple);
        let estimate = DistributionTaxEstimate::level(0.12, 73_100.0, &schedule);
        let segment = calc.calculate(twelve_percent_part(), &estimate);

        assert_relative_eq!(segment.conv_tax_rate, 0.12, max_relative = 1e-12);
        assert!((segment.synthetic_roth_contribution - 17_119.0).abs() < 1.0);
        assert!(segment.tax_rate_spread_amount.abs() < 1e-6);
        assert_eq!(
            segment.total_after_tax_payout,
            segment.synthetic_roth_contribution + segment.tax_rate_spread_amount
        );
        assert!((segment.return_multiple - 1.95).abs() < 0.01);
        assert!((segment.irr.rate().unwrap() - 0.05).abs() < 1e-6);
        assert!((segment.duration_years - 15.5).abs() < 1e-9);
    }

    #[test]
    fn test_positive_spread() {
        let schedule = schedule();
        let calc = ConversionEconomicsCalculator::new(schedule.annuity_factor_multiple);
        let estimate = DistributionTaxEstimate::level(0.1895, 73_100.0, &schedule);
        let segment = calc.calculate(twelve_percent_part(), &estimate);

        assert_relative_eq!(segment.tax_rate_spread_amount, 9_911.0, max_relative = 1e-3);
        assert_relative_eq!(segment.total_after_tax_payout, 27_030.0, max_relative = 1e-3);
        assert_relative_eq!(segment.total_after_tax_payout, estimate.tax_saved, max_relative = 1e-9);
        // Level stream: the spread lifts the return well above the 5% base return
        let irr = segment.irr.rate().unwrap();
        assert!((irr - 0.0962).abs() < 1e-3, "irr = {}", irr);
    }

    #[test]
    fn test_zero_tax_segment() {
        let schedule = schedule();
        let calc = ConversionEconomicsCalculator::new(schedule.annuity_factor_multiple);
        let input = SegmentInput {
            kind: SegmentKind::Cumulative,
            group_num: 1,
            bracket_rate: 0.0,
            amount: 31_500.0,
            tax: 0.0,
        };
        let estimate = DistributionTaxEstimate::level(0.10, 31_500.0, &schedule);
        let segment = calc.calculate(input, &estimate);

        assert_eq!(segment.return_multiple, ZERO_TAX_RETURN_MULTIPLE);
        assert_eq!(segment.irr, IrrSolution::Converged(1.0));
        assert_eq!(segment.synthetic_roth_contribution, 0.0);
        assert!(segment.tax_rate_spread_amount > 0.0);
    }

    #[test]
    fn test_negative_payout_does_not_converge() {
        let schedule = schedule();
        let calc = ConversionEconomicsCalculator::new(schedule.annuity_factor_multiple);
        let estimate = DistributionTaxEstimate::level(-0.05, 73_100.0, &schedule);
        let segment = calc.calculate(twelve_percent_part(), &estimate);

        assert_eq!(segment.irr, IrrSolution::NotConverged);
        assert!(segment.return_multiple < 0.0);
    }
}
