//! Running state carried from one projected year to the next

/// Balances and benefit at the start of a distribution year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearState {
    /// 0-indexed distribution year
    pub year_index: u32,

    /// Social Security benefit paid this year
    pub ss_benefit: f64,

    /// Beginning of year Traditional balance
    pub trad_balance: f64,

    /// Beginning of year Roth balance
    pub roth_balance: f64,
}

impl YearState {
    /// State at the start of the first distribution year
    pub fn initial(ss_benefit: f64, trad_balance: f64, roth_balance: f64) -> Self {
        Self {
            year_index: 0,
            ss_benefit,
            trad_balance,
            roth_balance,
        }
    }

    /// End-of-year balance after growth and an end-of-year distribution
    pub fn closing_balance(opening: f64, return_rate: f64, distribution: f64) -> f64 {
        opening * (1.0 + return_rate) - distribution
    }

    /// Roll forward to the next year
    pub fn advance(&self, return_rate: f64, ss_growth: f64, trad_distribution: f64, roth_distribution: f64) -> Self {
        Self {
            year_index: self.year_index + 1,
            ss_benefit: self.ss_benefit * (1.0 + ss_growth),
            trad_balance: Self::closing_balance(self.trad_balance, return_rate, trad_distribution),
            roth_balance: Self::closing_balance(self.roth_balance, return_rate, roth_distribution),
        }
    }
}
