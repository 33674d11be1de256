//! Load household profiles from CSV for batch runs

use super::{FilingStatus, HouseholdProfile, DEFAULT_START_AGE, DEFAULT_YEARS_UNTIL_START};
use crate::error::Result;
use csv::Reader;
use std::path::Path;

/// Raw CSV row; filing status is kept as text and parsed from its code
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    trad_savings: f64,
    #[serde(default)]
    roth_savings: f64,
    #[serde(default)]
    soc_sec_benefit: f64,
    filing_status: String,
    life_years: u32,
    return_assum: f64,
    inflation_assum: f64,
    soc_sec_growth_assum: f64,
    #[serde(default)]
    start_age: Option<u32>,
    #[serde(default)]
    years_until_start: Option<u32>,
}

impl CsvRow {
    fn to_profile(self) -> Result<HouseholdProfile> {
        let filing_status: FilingStatus = self.filing_status.parse()?;

        Ok(HouseholdProfile {
            trad_savings: self.trad_savings,
            roth_savings: self.roth_savings,
            soc_sec_benefit: self.soc_sec_benefit,
            filing_status,
            life_years: self.life_years,
            return_assum: self.return_assum,
            inflation_assum: self.inflation_assum,
            soc_sec_growth_assum: self.soc_sec_growth_assum,
            start_age: self.start_age.unwrap_or(DEFAULT_START_AGE),
            years_until_start: self.years_until_start.unwrap_or(DEFAULT_YEARS_UNTIL_START),
        })
    }
}

/// Load all profiles from a CSV file
pub fn load_profiles<P: AsRef<Path>>(path: P) -> Result<Vec<HouseholdProfile>> {
    let reader = Reader::from_path(path)?;
    collect_profiles(reader)
}

/// Load profiles from any reader (e.g., string buffer, request body)
pub fn load_profiles_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<HouseholdProfile>> {
    collect_profiles(Reader::from_reader(reader))
}

fn collect_profiles<R: std::io::Read>(mut reader: Reader<R>) -> Result<Vec<HouseholdProfile>> {
    let mut profiles = Vec::new();

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        profiles.push(row.to_profile()?);
    }

    Ok(profiles)
}
