//! Inflation-indexed bracket tables for projected years

use serde::{Deserialize, Serialize};

use super::tables::{Bracket, SsThresholds, StatusTables, TaxTables};
use crate::error::{EngineError, Result};
use crate::profile::FilingStatus;

/// Ordinary-income brackets and standard deduction for one filing status
/// and one projected year.
///
/// Bracket bounds are held in taxable-income dollars. In gross-income terms
/// the first bracket starts at the standard deduction, see [`Self::gross_thresholds`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBracketTable {
    pub filing_status: FilingStatus,
    /// Years after the base table year (0 = current year)
    pub year_offset: u32,
    pub brackets: Vec<Bracket>,
    pub standard_deduction: f64,
    pub age_65_addition: f64,
}

impl TaxBracketTable {
    /// Standard deduction for a filer of the given age
    pub fn deduction_for_age(&self, age: u32) -> f64 {
        if age >= 65 {
            self.standard_deduction + self.age_65_addition
        } else {
            self.standard_deduction
        }
    }

    /// Progressive federal tax on taxable income (after deductions)
    pub fn tax_on_taxable_income(&self, taxable_income: f64) -> f64 {
        if taxable_income <= 0.0 {
            return 0.0;
        }

        let mut tax = 0.0;
        let mut lower = 0.0;
        for bracket in &self.brackets {
            match bracket.upper {
                Some(upper) if taxable_income > upper => {
                    tax += (upper - lower) * bracket.rate;
                    lower = upper;
                }
                _ => {
                    tax += (taxable_income - lower) * bracket.rate;
                    break;
                }
            }
        }
        tax
    }

    /// Nominal rate applied to the next dollar of taxable income
    pub fn marginal_rate(&self, taxable_income: f64) -> f64 {
        if taxable_income <= 0.0 {
            return 0.0;
        }
        self.brackets
            .iter()
            .find(|b| b.upper.map_or(true, |upper| taxable_income + 1.0 <= upper))
            .map(|b| b.rate)
            .unwrap_or(0.0)
    }

    /// Tax on a conversion of `amount` with no other income in the year
    pub fn conversion_tax(&self, amount: f64) -> f64 {
        self.tax_on_taxable_income(amount - self.standard_deduction)
    }

    /// Gross-income tops of each bounded bracket: standard deduction plus bound
    pub fn gross_thresholds(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.brackets
            .iter()
            .filter_map(|b| b.upper.map(|upper| (b.rate, self.standard_deduction + upper)))
    }

    /// Rate of the unbounded top bracket
    pub fn top_rate(&self) -> f64 {
        self.brackets.last().map(|b| b.rate).unwrap_or(0.0)
    }
}

/// Projects base-year tables forward by compounding inflation
#[derive(Debug, Clone)]
pub struct TaxBracketProjector<'a> {
    tables: &'a TaxTables,
    inflation: f64,
}

impl<'a> TaxBracketProjector<'a> {
    pub fn new(tables: &'a TaxTables, inflation: f64) -> Result<Self> {
        // Factors at or below zero would collapse or invert bracket ordering
        if !inflation.is_finite() || inflation <= -1.0 {
            return Err(EngineError::InvalidAssumption {
                name: "inflation_assum",
                value: inflation,
            });
        }
        Ok(Self { tables, inflation })
    }

    /// Bracket table for `year_offset` years after the base year
    pub fn project(&self, status: FilingStatus, year_offset: u32) -> Result<TaxBracketTable> {
        let base = self.tables.for_status(status)?;
        Ok(scale(base, status, year_offset, self.inflation_factor(year_offset)))
    }

    /// Statutory Social Security thresholds (never inflated)
    pub fn ss_thresholds(&self, status: FilingStatus) -> Result<SsThresholds> {
        Ok(self.tables.for_status(status)?.ss_thresholds)
    }

    /// Calendar year of the base tables for a status
    pub fn base_year(&self, status: FilingStatus) -> Result<i32> {
        Ok(self.tables.for_status(status)?.year)
    }

    pub fn inflation_factor(&self, year_offset: u32) -> f64 {
        (1.0 + self.inflation).powi(year_offset as i32)
    }
}

fn scale(base: &StatusTables, status: FilingStatus, year_offset: u32, factor: f64) -> TaxBracketTable {
    TaxBracketTable {
        filing_status: status,
        year_offset,
        brackets: base
            .brackets
            .iter()
            .map(|b| Bracket::new(b.rate, b.upper.map(|upper| upper * factor)))
            .collect(),
        standard_deduction: base.deduction.base * factor,
        age_65_addition: base.deduction.age_65_addition * factor,
    }
}
