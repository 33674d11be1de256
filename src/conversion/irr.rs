//! Internal Rate of Return (IRR) calculation
//!
//! Used to express a conversion's payoff stream as an annual rate of return
//! on the conversion tax paid.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest annual rate searched (-99%)
pub const IRR_LOWER_BOUND: f64 = -0.99;

/// Highest annual rate searched (+1000%)
pub const IRR_UPPER_BOUND: f64 = 10.0;

const TOLERANCE: f64 = 1e-10;
const MAX_ITERATIONS: u32 = 200;

/// Outcome of the IRR search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IrrSolution {
    Converged(f64),
    /// No sign change on the search interval
    NotConverged,
}

impl IrrSolution {
    pub fn rate(&self) -> Option<f64> {
        match self {
            IrrSolution::Converged(rate) => Some(*rate),
            IrrSolution::NotConverged => None,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, IrrSolution::Converged(_))
    }
}

impl fmt::Display for IrrSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrrSolution::Converged(rate) => write!(f, "{:.2}%", rate * 100.0),
            IrrSolution::NotConverged => f.write_str("N/A"),
        }
    }
}

/// Calculate the IRR of annual cash flows (index 0 = today) by bisection
/// on [-99%, +1000%].
///
/// # Arguments
/// * `cashflows` - Cash flows (positive = inflow, negative = outflow)
///
/// # Returns
/// * `IrrSolution::NotConverged` when the NPV has the same sign at both ends
///   of the interval (including streams with no sign change)
pub fn calculate_irr(cashflows: &[f64]) -> IrrSolution {
    if cashflows.is_empty() {
        return IrrSolution::NotConverged;
    }

    let mut low = IRR_LOWER_BOUND;
    let mut high = IRR_UPPER_BOUND;
    let mut npv_low = npv_at_rate(cashflows, low);
    let npv_high = npv_at_rate(cashflows, high);

    if npv_low == 0.0 {
        return IrrSolution::Converged(low);
    }
    if npv_high == 0.0 {
        return IrrSolution::Converged(high);
    }
    // Check that we have a root in this interval
    if npv_low * npv_high > 0.0 || !npv_low.is_finite() || !npv_high.is_finite() {
        return IrrSolution::NotConverged;
    }

    for _ in 0..MAX_ITERATIONS {
        let mid = (low + high) / 2.0;
        let npv_mid = npv_at_rate(cashflows, mid);

        if npv_mid == 0.0 || (high - low) / 2.0 < TOLERANCE {
            return IrrSolution::Converged(mid);
        }

        if npv_mid * npv_low < 0.0 {
            high = mid;
        } else {
            low = mid;
            npv_low = npv_mid;
        }
    }

    IrrSolution::NotConverged
}

/// Calculate NPV at a given annual rate
pub fn npv_at_rate(cashflows: &[f64], rate: f64) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}
