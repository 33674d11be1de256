//! Household data structures consumed by a calculation run

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{EngineError, Result};

/// Default age in the first distribution year
pub const DEFAULT_START_AGE: u32 = 62;

/// Default years between the tax-table base year and the first distribution year
pub const DEFAULT_YEARS_UNTIL_START: u32 = 1;

/// Longest distribution horizon accepted
pub const MAX_LIFE_YEARS: u32 = 120;

/// Oldest age accepted for the first distribution year
pub const MAX_START_AGE: u32 = 120;

/// Furthest first distribution year accepted, in years after the table base year
pub const MAX_YEARS_UNTIL_START: u32 = 100;

fn default_start_age() -> u32 {
    DEFAULT_START_AGE
}

fn default_years_until_start() -> u32 {
    DEFAULT_YEARS_UNTIL_START
}

/// Federal filing status while distributing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilingStatus {
    Single,
    /// Married filing jointly
    MarriedFilingJointly,
    HeadOfHousehold,
}

impl FilingStatus {
    pub const ALL: [FilingStatus; 3] = [
        FilingStatus::Single,
        FilingStatus::MarriedFilingJointly,
        FilingStatus::HeadOfHousehold,
    ];

    /// Single-letter code used in the reference data files (S, M, H)
    pub fn code(&self) -> &'static str {
        match self {
            FilingStatus::Single => "S",
            FilingStatus::MarriedFilingJointly => "M",
            FilingStatus::HeadOfHousehold => "H",
        }
    }
}

impl fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FilingStatus::Single => "Single",
            FilingStatus::MarriedFilingJointly => "Married Filing Jointly",
            FilingStatus::HeadOfHousehold => "Head of Household",
        };
        f.write_str(label)
    }
}

impl FromStr for FilingStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "single" => Ok(FilingStatus::Single),
            "m" | "mfj" | "married" | "marriedfilingjointly" | "married_filing_jointly" => {
                Ok(FilingStatus::MarriedFilingJointly)
            }
            "h" | "hoh" | "headofhousehold" | "head_of_household" => {
                Ok(FilingStatus::HeadOfHousehold)
            }
            _ => Err(EngineError::InvalidFilingStatus(s.to_string())),
        }
    }
}

/// Immutable household snapshot for one calculation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdProfile {
    /// Traditional (pre-tax) retirement savings
    pub trad_savings: f64,

    /// Roth (tax-free) retirement savings
    #[serde(default)]
    pub roth_savings: f64,

    /// Annual Social Security benefit in current-year dollars
    #[serde(default)]
    pub soc_sec_benefit: f64,

    pub filing_status: FilingStatus,

    /// Years of retirement distributions
    pub life_years: u32,

    /// Portfolio return assumed while distributing
    pub return_assum: f64,

    /// Inflation applied to brackets and standard deductions
    pub inflation_assum: f64,

    /// Annual growth of the Social Security benefit
    pub soc_sec_growth_assum: f64,

    /// Age in the first distribution year
    #[serde(default = "default_start_age")]
    pub start_age: u32,

    /// Years from the tax-table base year to the first distribution year
    #[serde(default = "default_years_until_start")]
    pub years_until_start: u32,
}

impl HouseholdProfile {
    /// Create a profile with the default retirement timeline
    pub fn new(
        trad_savings: f64,
        roth_savings: f64,
        soc_sec_benefit: f64,
        filing_status: FilingStatus,
        life_years: u32,
        return_assum: f64,
        inflation_assum: f64,
        soc_sec_growth_assum: f64,
    ) -> Self {
        Self {
            trad_savings,
            roth_savings,
            soc_sec_benefit,
            filing_status,
            life_years,
            return_assum,
            inflation_assum,
            soc_sec_growth_assum,
            start_age: DEFAULT_START_AGE,
            years_until_start: DEFAULT_YEARS_UNTIL_START,
        }
    }

    /// Override the retirement timeline
    pub fn with_timeline(mut self, start_age: u32, years_until_start: u32) -> Self {
        self.start_age = start_age;
        self.years_until_start = years_until_start;
        self
    }

    /// Age in a given distribution year (0-indexed)
    pub fn age_in_year(&self, year_index: u32) -> u32 {
        self.start_age + year_index
    }

    /// Offset from the tax-table base year for a given distribution year
    pub fn table_year_offset(&self, year_index: u32) -> u32 {
        self.years_until_start + year_index
    }

    /// Fail fast on inputs the engine cannot project
    pub fn validate(&self) -> Result<()> {
        if !self.trad_savings.is_finite() || self.trad_savings <= 0.0 {
            return Err(EngineError::invalid_profile(
                "trad_savings",
                format!("must be positive, got {}", self.trad_savings),
            ));
        }
        if !self.roth_savings.is_finite() || self.roth_savings < 0.0 {
            return Err(EngineError::invalid_profile(
                "roth_savings",
                format!("must be non-negative, got {}", self.roth_savings),
            ));
        }
        if !self.soc_sec_benefit.is_finite() || self.soc_sec_benefit < 0.0 {
            return Err(EngineError::invalid_profile(
                "soc_sec_benefit",
                format!("must be non-negative, got {}", self.soc_sec_benefit),
            ));
        }
        if self.life_years == 0 || self.life_years > MAX_LIFE_YEARS {
            return Err(EngineError::InvalidHorizon(i64::from(self.life_years)));
        }
        if self.start_age > MAX_START_AGE {
            return Err(EngineError::invalid_profile(
                "start_age",
                format!("must be at most {}, got {}", MAX_START_AGE, self.start_age),
            ));
        }
        if self.years_until_start > MAX_YEARS_UNTIL_START {
            return Err(EngineError::invalid_profile(
                "years_until_start",
                format!("must be at most {}, got {}", MAX_YEARS_UNTIL_START, self.years_until_start),
            ));
        }

        let rates = [
            ("return_assum", self.return_assum),
            ("inflation_assum", self.inflation_assum),
            ("soc_sec_growth_assum", self.soc_sec_growth_assum),
        ];
        for (name, value) in rates {
            // Rates at or below -100% invert compounding
            if !value.is_finite() || value <= -1.0 || value > 1.0 {
                return Err(EngineError::InvalidAssumption { name, value });
            }
        }

        Ok(())
    }
}
