//! Conversion output rows

use serde::{Deserialize, Serialize};

use super::irr::IrrSolution;

/// Whether a row covers all brackets up to its group or a single bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    /// Brackets 1..=k converted together
    Cumulative,
    /// Bracket k alone, on top of brackets 1..k
    Isolated,
}

/// Payoff decomposition and investment metrics for one conversion segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionSegment {
    pub kind: SegmentKind,
    /// 1 = standard deduction (0% bracket)
    pub group_num: u32,

    /// Nominal rate of the highest bracket reached
    pub tax_bracket_rate: f64,
    pub conversion_amount: f64,
    pub conversion_tax: f64,
    /// Conversion tax / amount (t_C)
    pub conv_tax_rate: f64,
    /// Effective future distribution tax rate (t_D)
    pub distribution_tax_rate: f64,

    pub synthetic_roth_contribution: f64,
    pub tax_rate_spread_amount: f64,
    pub total_after_tax_payout: f64,
    pub return_multiple: f64,
    pub irr: IrrSolution,
    pub duration_years: f64,

    /// Distribution tax avoided over the horizon
    pub conversion_dist_tax: f64,
    /// Horizon-average adjusted marginal rate without the conversion
    pub dist_mtr_pre: f64,
    /// Horizon-average adjusted marginal rate with the conversion
    pub dist_mtr_post: f64,
}

impl ConversionSegment {
    pub fn label(&self) -> String {
        match self.kind {
            SegmentKind::Cumulative => format!("Conversion {}", self.group_num),
            SegmentKind::Isolated => format!("Part {}", self.group_num),
        }
    }
}
