//! Level-annuity distribution schedule
//!
//! A lump sum drawn down in equal end-of-year payments over a fixed horizon
//! at an assumed return. The annuity factor multiple `M` is the ratio of
//! total nominal payments to the starting principal.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Returns at or below this magnitude use the zero-return limit
pub const DEGENERATE_RETURN_EPSILON: f64 = 1e-9;

fn is_degenerate(return_rate: f64) -> bool {
    return_rate.abs() <= DEGENERATE_RETURN_EPSILON
}

/// Level payment per dollar of principal: `r / (1 - (1+r)^-n)`, or `1/n` at zero return
pub fn annuity_factor(return_rate: f64, horizon_years: u32) -> f64 {
    let n = horizon_years as f64;
    if is_degenerate(return_rate) {
        return 1.0 / n;
    }
    return_rate / (1.0 - (1.0 + return_rate).powf(-n))
}

/// Present value of 1 per year for `horizon_years` years: the inverse of [`annuity_factor`]
pub fn present_value_factor(return_rate: f64, horizon_years: u32) -> f64 {
    let n = horizon_years as f64;
    if is_degenerate(return_rate) {
        return n;
    }
    (1.0 - (1.0 + return_rate).powf(-n)) / return_rate
}

/// Distribution schedule derived once per run from the Traditional balance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionSchedule {
    /// Constant end-of-year distribution
    pub annual_distribution: f64,

    /// Payment per dollar of principal
    pub annuity_factor: f64,

    /// Total distributions divided by principal (M)
    pub annuity_factor_multiple: f64,

    /// Years of compounding at the assumed return needed to reach M
    pub base_duration: f64,

    pub horizon_years: u32,
    pub return_rate: f64,
}

impl DistributionSchedule {
    /// Schedule for `principal` distributed over `horizon_years` at `return_rate`
    pub fn calculate(principal: f64, return_rate: f64, horizon_years: u32) -> Result<Self> {
        if horizon_years == 0 {
            return Err(EngineError::InvalidHorizon(0));
        }
        if !return_rate.is_finite() || return_rate <= -1.0 {
            return Err(EngineError::InvalidAssumption {
                name: "return_assum",
                value: return_rate,
            });
        }
        if is_degenerate(return_rate) {
            log::debug!("return {return_rate} treated as zero; using straight-line distribution");
        }

        let n = horizon_years as f64;
        let factor = annuity_factor(return_rate, horizon_years);
        let multiple = n * factor;

        let base_duration = if return_rate > DEGENERATE_RETURN_EPSILON {
            multiple.ln() / (1.0 + return_rate).ln()
        } else {
            n / 2.0
        };

        Ok(Self {
            annual_distribution: principal * factor,
            annuity_factor: factor,
            annuity_factor_multiple: multiple,
            base_duration,
            horizon_years,
            return_rate,
        })
    }

    /// Level payment for another balance distributed on the same terms
    pub fn distribution_for(&self, balance: f64) -> f64 {
        balance * self.annuity_factor
    }

    /// Total nominal distributions over the horizon
    pub fn total_distributions(&self) -> f64 {
        self.annual_distribution * self.horizon_years as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_million_over_thirty_years() {
        let schedule = DistributionSchedule::calculate(1_000_000.0, 0.05, 30).unwrap();

        assert!((schedule.annual_distribution - 65_051.0).abs() < 1.0);
        assert!((schedule.annuity_factor_multiple - 1.9515).abs() < 1e-4);
        // ln(1.9515) / ln(1.05)
        assert!((schedule.base_duration - 13.70).abs() < 0.01);
    }

    #[test]
    fn test_multiple_identity() {
        for &(principal, rate, years) in &[
            (1_000_000.0, 0.05, 30),
            (250_000.0, 0.08, 15),
            (750_000.0, 0.02, 45),
            (10_000.0, -0.02, 10),
        ] {
            let s = DistributionSchedule::calculate(principal, rate, years).unwrap();
            assert_relative_eq!(
                s.annuity_factor_multiple,
                s.annual_distribution * years as f64 / principal,
                max_relative = 1e-12
            );
            assert_relative_eq!(s.total_distributions(), principal * s.annuity_factor_multiple, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_present_value_inverts_factor() {
        let pv = present_value_factor(0.05, 30);
        assert_relative_eq!(pv * annuity_factor(0.05, 30), 1.0, max_relative = 1e-12);
    }

    #[test]
    fn test_zero_return_limit() {
        let s = DistributionSchedule::calculate(300_000.0, 0.0, 30).unwrap();
        assert_relative_eq!(s.annual_distribution, 10_000.0, max_relative = 1e-12);
        assert_relative_eq!(s.annuity_factor_multiple, 1.0, max_relative = 1e-12);
        assert_eq!(s.base_duration, 15.0);
        assert_eq!(present_value_factor(0.0, 30), 30.0);

        // Within epsilon of zero uses the same limit
        let near = DistributionSchedule::calculate(300_000.0, 1e-12, 30).unwrap();
        assert_eq!(near.annual_distribution, s.annual_distribution);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            DistributionSchedule::calculate(100_000.0, 0.05, 0),
            Err(EngineError::InvalidHorizon(0))
        ));
        assert!(matches!(
            DistributionSchedule::calculate(100_000.0, -1.0, 10),
            Err(EngineError::InvalidAssumption { name: "return_assum", .. })
        ));
    }
}
