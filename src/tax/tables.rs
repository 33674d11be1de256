//! Versioned base-year federal tax reference data

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::profile::FilingStatus;

/// One ordinary-income bracket, bounded above in taxable-income dollars
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub rate: f64,
    /// Upper bound of taxable income taxed at `rate` (None = top bracket)
    pub upper: Option<f64>,
}

impl Bracket {
    pub fn new(rate: f64, upper: Option<f64>) -> Self {
        Self { rate, upper }
    }
}

/// Standard deduction and the additional amount allowed from age 65
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardDeduction {
    pub base: f64,
    pub age_65_addition: f64,
}

/// Provisional-income thresholds for taxing Social Security benefits.
/// These are statutory and are not indexed for inflation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SsThresholds {
    /// Up to 50% of benefits become taxable above this amount
    pub base_amount: f64,
    /// Up to 85% of benefits become taxable above this amount
    pub adjusted_base_amount: f64,
}

/// All reference data for one filing status in its base year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusTables {
    pub year: i32,
    pub brackets: Vec<Bracket>,
    pub deduction: StandardDeduction,
    pub ss_thresholds: SsThresholds,
}

impl StatusTables {
    /// Check ordering invariants: rates and bounds strictly increasing,
    /// only the last bracket unbounded
    pub fn validate(&self, status: FilingStatus) -> Result<()> {
        if self.brackets.is_empty() {
            return Err(EngineError::InvalidTaxTable(format!("{status}: no brackets")));
        }

        let last = self.brackets.len() - 1;
        let mut prev: Option<&Bracket> = None;
        for (i, bracket) in self.brackets.iter().enumerate() {
            if !(0.0..1.0).contains(&bracket.rate) {
                return Err(EngineError::InvalidTaxTable(format!(
                    "{status}: rate {} out of range",
                    bracket.rate
                )));
            }
            match (bracket.upper, i == last) {
                (None, false) => {
                    return Err(EngineError::InvalidTaxTable(format!(
                        "{status}: unbounded bracket at {:.1}% is not the top bracket",
                        bracket.rate * 100.0
                    )));
                }
                (Some(upper), _) if !(upper > 0.0) => {
                    return Err(EngineError::InvalidTaxTable(format!(
                        "{status}: non-positive bracket bound {upper}"
                    )));
                }
                _ => {}
            }
            if let Some(prev) = prev {
                if bracket.rate <= prev.rate {
                    return Err(EngineError::InvalidTaxTable(format!(
                        "{status}: rates not strictly increasing"
                    )));
                }
                if let (Some(a), Some(b)) = (prev.upper, bracket.upper) {
                    if b <= a {
                        return Err(EngineError::InvalidTaxTable(format!(
                            "{status}: bounds not strictly increasing"
                        )));
                    }
                }
            }
            prev = Some(bracket);
        }

        if self.deduction.base < 0.0 || self.deduction.age_65_addition < 0.0 {
            return Err(EngineError::InvalidTaxTable(format!(
                "{status}: negative standard deduction"
            )));
        }
        if self.ss_thresholds.adjusted_base_amount <= self.ss_thresholds.base_amount {
            return Err(EngineError::InvalidTaxTable(format!(
                "{status}: Social Security thresholds out of order"
            )));
        }

        Ok(())
    }
}

/// Base-year tax tables for every supported filing status.
/// Injected per run; never mutated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxTables {
    by_status: HashMap<FilingStatus, StatusTables>,
}

impl TaxTables {
    /// Build from per-status tables, validating each
    pub fn new(by_status: HashMap<FilingStatus, StatusTables>) -> Result<Self> {
        for (status, tables) in &by_status {
            tables.validate(*status)?;
        }
        Ok(Self { by_status })
    }

    /// IRS 2025 figures (Rev. Proc. 2024-40, standard deductions as amended in 2025)
    pub fn default_2025() -> Self {
        let brackets = |bounds: [f64; 6]| {
            let rates = [0.10, 0.12, 0.22, 0.24, 0.32, 0.35];
            let mut brackets: Vec<Bracket> = rates
                .iter()
                .zip(bounds)
                .map(|(&rate, upper)| Bracket::new(rate, Some(upper)))
                .collect();
            brackets.push(Bracket::new(0.37, None));
            brackets
        };

        let mut by_status = HashMap::new();
        by_status.insert(
            FilingStatus::Single,
            StatusTables {
                year: 2025,
                brackets: brackets([11_925.0, 48_475.0, 103_350.0, 197_300.0, 250_525.0, 626_350.0]),
                deduction: StandardDeduction { base: 15_750.0, age_65_addition: 2_000.0 },
                ss_thresholds: SsThresholds { base_amount: 25_000.0, adjusted_base_amount: 34_000.0 },
            },
        );
        by_status.insert(
            FilingStatus::MarriedFilingJointly,
            StatusTables {
                year: 2025,
                brackets: brackets([23_850.0, 96_950.0, 206_700.0, 394_600.0, 501_050.0, 751_600.0]),
                deduction: StandardDeduction { base: 31_500.0, age_65_addition: 1_600.0 },
                ss_thresholds: SsThresholds { base_amount: 32_000.0, adjusted_base_amount: 44_000.0 },
            },
        );
        by_status.insert(
            FilingStatus::HeadOfHousehold,
            StatusTables {
                year: 2025,
                brackets: brackets([17_050.0, 64_650.0, 103_350.0, 197_300.0, 250_525.0, 626_350.0]),
                deduction: StandardDeduction { base: 23_625.0, age_65_addition: 2_000.0 },
                ss_thresholds: SsThresholds { base_amount: 25_000.0, adjusted_base_amount: 34_000.0 },
            },
        );

        Self { by_status }
    }

    /// Tables for a filing status
    pub fn for_status(&self, status: FilingStatus) -> Result<&StatusTables> {
        self.by_status
            .get(&status)
            .ok_or_else(|| EngineError::InvalidFilingStatus(format!("no tax tables for {status}")))
    }
}

impl Default for TaxTables {
    fn default() -> Self {
        Self::default_2025()
    }
}
