//! Roth conversion decomposition by tax bracket
//!
//! The Traditional balance is split into conversion groups (standard
//! deduction, then each bracket in turn). For every group the engine
//! reports a cumulative row (all brackets up to it) and an isolated part
//! (that bracket alone), each with its payoff decomposition and metrics.

mod brackets;
mod distribution_rate;
mod economics;
pub mod irr;
mod segment;

pub use brackets::{ConversionBracketBuilder, ConversionGroup};
pub use distribution_rate::{payout_duration, DistributionTaxEstimate, DistributionTaxRateEstimator};
pub use economics::{ConversionEconomicsCalculator, SegmentInput, ZERO_TAX_IRR, ZERO_TAX_RETURN_MULTIPLE};
pub use irr::{calculate_irr, IrrSolution};
pub use segment::{ConversionSegment, SegmentKind};
