//! Error taxonomy for the distribution and conversion engine
//!
//! All errors are values. Non-convergence of a segment IRR is deliberately
//! absent here: it is carried on the segment as [`crate::conversion::IrrSolution`]
//! so one bracket cannot block the others.

use thiserror::Error;

/// Errors surfaced by the engine and its loaders
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or out-of-range household input
    #[error("invalid profile: {field} {reason}")]
    InvalidProfile { field: &'static str, reason: String },

    /// Filing status code not recognised, or no table data for it
    #[error("invalid filing status: {0}")]
    InvalidFilingStatus(String),

    /// Rate assumption outside the domain the projector can handle
    #[error("invalid assumption: {name} = {value}")]
    InvalidAssumption { name: &'static str, value: f64 },

    /// Distribution horizon must be at least one year
    #[error("invalid horizon: {0} years")]
    InvalidHorizon(i64),

    /// Reference tax data violates ordering invariants
    #[error("invalid tax table: {0}")]
    InvalidTaxTable(String),

    /// Isolated parts failed to sum to the cumulative conversion row
    #[error(
        "decomposition mismatch in group {group_num} for {field}: cumulative {cumulative:.6}, parts {parts:.6}"
    )]
    DecompositionMismatch {
        group_num: u32,
        field: &'static str,
        cumulative: f64,
        parts: f64,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

impl EngineError {
    pub(crate) fn invalid_profile(field: &'static str, reason: impl Into<String>) -> Self {
        EngineError::InvalidProfile {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
