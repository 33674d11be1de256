//! Household profile data and loading

mod data;
pub mod loader;

pub use data::{
    FilingStatus, HouseholdProfile, DEFAULT_START_AGE, DEFAULT_YEARS_UNTIL_START, MAX_LIFE_YEARS, MAX_START_AGE,
    MAX_YEARS_UNTIL_START,
};
pub use loader::{load_profiles, load_profiles_from_reader};
