//! Year-by-year retirement projection output

use serde::{Deserialize, Serialize};

/// One projected distribution year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetirementYearRecord {
    // Timing
    /// 0-indexed distribution year
    pub year_index: u32,
    pub calendar_year: i32,
    pub age: u32,

    // Income
    pub ss_benefit: f64,
    pub taxable_ss: f64,
    /// Share of the benefit included in taxable income
    pub pct_ss_taxed: f64,
    pub trad_distribution: f64,
    pub roth_distribution: f64,

    // Tax
    pub standard_deduction: f64,
    pub taxable_income: f64,
    pub federal_tax: f64,
    pub marginal_trad_tax_rate: f64,
    /// Marginal rate including benefit inclusion (up to 1.85x nominal)
    pub adjusted_marginal_tax_rate: f64,

    // Net
    /// Social Security plus Traditional distribution, less tax
    pub after_tax_cash_flow: f64,
    /// Roth plus Traditional distribution, less tax
    pub after_tax_distribution: f64,

    // End-of-year balances
    pub trad_balance: f64,
    pub roth_balance: f64,
}

/// Ordered records for one set of starting balances
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetirementProjection {
    pub trad_savings: f64,
    pub roth_savings: f64,
    pub records: Vec<RetirementYearRecord>,
}

impl RetirementProjection {
    /// Horizon average of the adjusted marginal rate
    pub fn average_adjusted_marginal_rate(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        self.records.iter().map(|r| r.adjusted_marginal_tax_rate).sum::<f64>() / self.records.len() as f64
    }
}
