//! Distribution schedule and year-by-year retirement projection

mod annuity;
mod engine;
mod records;
mod state;

pub use annuity::{annuity_factor, present_value_factor, DistributionSchedule, DEGENERATE_RETURN_EPSILON};
pub use engine::PreConversionProjector;
pub use records::{RetirementProjection, RetirementYearRecord};
pub use state::YearState;
