//! Federal tax reference data and calculations
//!
//! Base-year tables are loaded once per run (embedded 2025 figures or CSV
//! files) and projected forward by inflation for each distribution year.

mod brackets;
pub mod loader;
mod social_security;
mod tables;

pub use brackets::{TaxBracketProjector, TaxBracketTable};
pub use loader::{LoadedTaxTables, DEFAULT_TAX_TABLES_PATH};
pub use social_security::{SocialSecurityTaxRule, SocialSecurityTaxation};
pub use tables::{Bracket, SsThresholds, StandardDeduction, StatusTables, TaxTables};
