//! Roth Engine - Retirement distribution projection and Roth conversion economics
//!
//! This library provides:
//! - Level-annuity distribution schedules and the annuity factor multiple (M)
//! - Year-by-year federal tax projection with inflation-indexed brackets
//! - Social Security benefit taxation (provisional income worksheet)
//! - Bracket-by-bracket Roth conversion decomposition with payoff metrics
//!   (synthetic Roth contribution, tax-rate spread, multiple, IRR, duration)
//! - Parallel batch runs over many households

pub mod conversion;
pub mod engine;
pub mod error;
pub mod profile;
pub mod projection;
pub mod tax;

// Re-export commonly used types
pub use conversion::{ConversionSegment, IrrSolution, SegmentKind};
pub use engine::{EngineResult, RothEngine};
pub use error::{EngineError, Result};
pub use profile::{FilingStatus, HouseholdProfile};
pub use projection::{DistributionSchedule, RetirementYearRecord};
pub use tax::TaxTables;
