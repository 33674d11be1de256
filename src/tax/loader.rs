//! CSV-based tax table loader
//!
//! Loads federal reference data from CSV files in data/tax_tables/. Each file
//! may hold several years; the latest year not after the requested year wins.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use super::tables::{Bracket, SsThresholds, StandardDeduction, StatusTables, TaxTables};
use crate::error::{EngineError, Result};
use crate::profile::FilingStatus;

/// Default path to the tax table directory
pub const DEFAULT_TAX_TABLES_PATH: &str = "data/tax_tables";

#[derive(Debug, Clone, Deserialize)]
pub struct BracketRow {
    pub year: i32,
    pub filing_status: String,
    pub tax_rate: f64,
    /// Empty for the top bracket
    pub income_max: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeductionRow {
    pub year: i32,
    pub filing_status: String,
    pub std_ded: f64,
    pub std_ded_65_add: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SsThresholdRow {
    pub year: i32,
    pub filing_status: String,
    pub base_amount: f64,
    pub adjusted_base_amount: f64,
}

fn load_rows<T: for<'de> Deserialize<'de>>(path: &Path, file_name: &str) -> Result<Vec<T>> {
    let file = File::open(path.join(file_name))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}

/// Load ordinary-income brackets from tax_brackets.csv
pub fn load_tax_brackets(path: &Path) -> Result<Vec<BracketRow>> {
    load_rows(path, "tax_brackets.csv")
}

/// Load standard deductions from standard_deductions.csv
pub fn load_standard_deductions(path: &Path) -> Result<Vec<DeductionRow>> {
    load_rows(path, "standard_deductions.csv")
}

/// Load Social Security provisional-income thresholds from ss_thresholds.csv
pub fn load_ss_thresholds(path: &Path) -> Result<Vec<SsThresholdRow>> {
    load_rows(path, "ss_thresholds.csv")
}

/// Raw rows from all tax table files
#[derive(Debug, Clone)]
pub struct LoadedTaxTables {
    pub brackets: Vec<BracketRow>,
    pub deductions: Vec<DeductionRow>,
    pub ss_thresholds: Vec<SsThresholdRow>,
}

impl LoadedTaxTables {
    /// Load all tables from the default path
    pub fn load_default() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_TAX_TABLES_PATH))
    }

    /// Load all tables from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        Ok(Self {
            brackets: load_tax_brackets(path)?,
            deductions: load_standard_deductions(path)?,
            ss_thresholds: load_ss_thresholds(path)?,
        })
    }

    /// Assemble per-status tables for `year`, or the latest year on file when None
    pub fn select(&self, year: Option<i32>) -> Result<TaxTables> {
        let mut by_status = HashMap::new();

        for status in FilingStatus::ALL {
            let matches_status = |code: &str| code.parse::<FilingStatus>().ok() == Some(status);

            let bracket_year = latest_year(
                self.brackets.iter().filter(|r| matches_status(&r.filing_status)).map(|r| r.year),
                year,
            );
            // A status with no brackets on file is simply unsupported by these tables
            let Some(bracket_year) = bracket_year else {
                continue;
            };

            let mut brackets: Vec<Bracket> = self
                .brackets
                .iter()
                .filter(|r| r.year == bracket_year && matches_status(&r.filing_status))
                .map(|r| Bracket::new(r.tax_rate, r.income_max))
                .collect();
            brackets.sort_by(|a, b| a.rate.total_cmp(&b.rate));

            let deduction = self
                .deductions
                .iter()
                .filter(|r| matches_status(&r.filing_status) && year.map_or(true, |y| r.year <= y))
                .max_by_key(|r| r.year)
                .map(|r| StandardDeduction {
                    base: r.std_ded,
                    age_65_addition: r.std_ded_65_add,
                })
                .ok_or_else(|| {
                    EngineError::InvalidTaxTable(format!("no standard deduction for {status}"))
                })?;

            let ss_thresholds = self
                .ss_thresholds
                .iter()
                .filter(|r| matches_status(&r.filing_status) && year.map_or(true, |y| r.year <= y))
                .max_by_key(|r| r.year)
                .map(|r| SsThresholds {
                    base_amount: r.base_amount,
                    adjusted_base_amount: r.adjusted_base_amount,
                })
                .ok_or_else(|| {
                    EngineError::InvalidTaxTable(format!("no Social Security thresholds for {status}"))
                })?;

            by_status.insert(
                status,
                StatusTables {
                    year: bracket_year,
                    brackets,
                    deduction,
                    ss_thresholds,
                },
            );
        }

        if by_status.is_empty() {
            return Err(EngineError::InvalidTaxTable(format!(
                "no brackets on file for year {year:?}"
            )));
        }

        TaxTables::new(by_status)
    }
}

fn latest_year(years: impl Iterator<Item = i32>, limit: Option<i32>) -> Option<i32> {
    years.filter(|y| limit.map_or(true, |limit| *y <= limit)).max()
}

impl TaxTables {
    /// Load the latest tables from CSV files in the default location (data/tax_tables/)
    pub fn from_csv() -> Result<Self> {
        Self::from_csv_path(Path::new(DEFAULT_TAX_TABLES_PATH))
    }

    /// Load the latest tables from CSV files in a specific directory
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        LoadedTaxTables::load_from(path)?.select(None)
    }

    /// Load the tables in force for `year` from a specific directory
    pub fn from_csv_path_for_year(path: &Path, year: i32) -> Result<Self> {
        LoadedTaxTables::load_from(path)?.select(Some(year))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_tax_tables() {
        let result = LoadedTaxTables::load_default();
        assert!(result.is_ok(), "Failed to load tax tables: {:?}", result.err());

        let loaded = result.unwrap();
        assert!(loaded.brackets.len() >= 21);
        assert!(loaded.deductions.len() >= 3);
        assert!(!loaded.ss_thresholds.is_empty());
    }

    #[test]
    fn test_csv_2025_matches_embedded_tables() {
        let from_csv =
            TaxTables::from_csv_path_for_year(Path::new(DEFAULT_TAX_TABLES_PATH), 2025).unwrap();
        let embedded = TaxTables::default_2025();

        for status in FilingStatus::ALL {
            assert_eq!(
                from_csv.for_status(status).unwrap(),
                embedded.for_status(status).unwrap(),
                "mismatch for {status}"
            );
        }
    }

    #[test]
    fn test_latest_year_selection() {
        let tables = TaxTables::from_csv().unwrap();
        let mfj = tables.for_status(FilingStatus::MarriedFilingJointly).unwrap();

        assert_eq!(mfj.year, 2026);
        assert_eq!(mfj.deduction.base, 32_200.0);
        assert_eq!(mfj.brackets[0].upper, Some(24_800.0));
        // Thresholds only published for 2025; carried forward
        assert_eq!(mfj.ss_thresholds.base_amount, 32_000.0);
    }

    #[test]
    fn test_select_before_first_year_fails() {
        let loaded = LoadedTaxTables::load_default().unwrap();
        assert!(matches!(loaded.select(Some(1990)), Err(EngineError::InvalidTaxTable(_))));
    }
}
