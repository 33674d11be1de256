//! Engine entry point: one household in, three result tables out
//!
//! Tax tables are loaded once and shared by every run. Runs hold no state
//! between calls, so batches are evaluated in parallel.

use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::conversion::{
    ConversionBracketBuilder, ConversionEconomicsCalculator, ConversionGroup, ConversionSegment,
    DistributionTaxRateEstimator, SegmentInput, SegmentKind,
};
use crate::error::{EngineError, Result};
use crate::profile::HouseholdProfile;
use crate::projection::{DistributionSchedule, PreConversionProjector, RetirementProjection, RetirementYearRecord};
use crate::tax::TaxTables;

/// Relative tolerance for isolated parts summing to the cumulative row
pub const RECONCILIATION_TOLERANCE: f64 = 1e-6;

/// Everything produced by one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineResult {
    pub profile: HouseholdProfile,
    pub schedule: DistributionSchedule,
    /// Baseline projection, one record per distribution year
    pub records: Vec<RetirementYearRecord>,
    /// Conversion rows: brackets 1..=k
    pub cumulative: Vec<ConversionSegment>,
    /// Part rows: bracket k alone
    pub isolated: Vec<ConversionSegment>,
}

/// Pre-loaded engine for single and batch runs
///
/// # Example
/// ```ignore
/// let engine = RothEngine::from_csv()?;
/// let result = engine.run(&profile)?;
/// for part in &result.isolated {
///     println!("{} {:.1}% {}", part.label(), part.distribution_tax_rate * 100.0, part.irr);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RothEngine {
    tables: TaxTables,
}

impl RothEngine {
    pub fn new(tables: TaxTables) -> Self {
        Self { tables }
    }

    /// Create engine by loading tax tables from CSV files
    pub fn from_csv() -> Result<Self> {
        Ok(Self::new(TaxTables::from_csv()?))
    }

    /// Create engine from a specific tax table directory
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        Ok(Self::new(TaxTables::from_csv_path(path)?))
    }

    pub fn tables(&self) -> &TaxTables {
        &self.tables
    }

    /// Run the full calculation for one household
    pub fn run(&self, profile: &HouseholdProfile) -> Result<EngineResult> {
        let projector = PreConversionProjector::new(profile, &self.tables)?;
        let schedule = *projector.schedule();

        log::info!(
            "Run: trad ${:.0}, roth ${:.0}, SS ${:.0}, {}, {} years at {:.2}% (annual ${:.2}, M {:.4}, duration {:.2})",
            profile.trad_savings,
            profile.roth_savings,
            profile.soc_sec_benefit,
            profile.filing_status,
            profile.life_years,
            profile.return_assum * 100.0,
            schedule.annual_distribution,
            schedule.annuity_factor_multiple,
            schedule.base_duration
        );

        let baseline = projector.baseline();
        let groups = ConversionBracketBuilder::new(projector.current_year_table()).build(profile.trad_savings);

        // Group k converts its cumulative amount from Traditional to Roth
        let converted: Vec<_> = groups
            .iter()
            .map(|g| {
                projector.project(
                    profile.trad_savings - g.cumulative_amount,
                    profile.roth_savings + g.cumulative_amount,
                )
            })
            .collect();

        let estimator = DistributionTaxRateEstimator::new();
        let economics = ConversionEconomicsCalculator::new(schedule.annuity_factor_multiple);

        let mut cumulative = Vec::with_capacity(groups.len());
        let mut isolated = Vec::with_capacity(groups.len());
        let mut previous: Option<(&ConversionGroup, &RetirementProjection)> = None;

        for (group, projection) in groups.iter().zip(&converted) {
            let estimate = estimator.estimate(&baseline, projection);
            cumulative.push(economics.calculate(
                SegmentInput {
                    kind: SegmentKind::Cumulative,
                    group_num: group.group_num,
                    bracket_rate: group.bracket_rate,
                    amount: group.cumulative_amount,
                    tax: group.cumulative_tax,
                },
                &estimate,
            ));

            let (amount, tax) = group.isolated_from(previous.map(|(g, _)| g));
            let before = previous.map_or(&baseline, |(_, p)| p);
            let estimate = estimator.estimate(before, projection);
            isolated.push(economics.calculate(
                SegmentInput {
                    kind: SegmentKind::Isolated,
                    group_num: group.group_num,
                    bracket_rate: group.bracket_rate,
                    amount,
                    tax,
                },
                &estimate,
            ));

            previous = Some((group, projection));
        }

        log::debug!(
            "{} conversion groups ({} cumulative, {} isolated segments)",
            groups.len(),
            cumulative.len(),
            isolated.len()
        );

        reconcile(&cumulative, &isolated)?;

        Ok(EngineResult {
            profile: profile.clone(),
            schedule,
            records: baseline.records,
            cumulative,
            isolated,
        })
    }

    /// Run independent households in parallel
    pub fn run_batch(&self, profiles: &[HouseholdProfile]) -> Vec<Result<EngineResult>> {
        profiles.par_iter().map(|profile| self.run(profile)).collect()
    }
}

impl Default for RothEngine {
    fn default() -> Self {
        Self::new(TaxTables::default_2025())
    }
}

/// Compare running sums of isolated parts with each cumulative row
pub fn decomposition_mismatches(cumulative: &[ConversionSegment], isolated: &[ConversionSegment]) -> Vec<EngineError> {
    type Field = (&'static str, fn(&ConversionSegment) -> f64);
    let fields: [Field; 5] = [
        ("conversion_amount", |s: &ConversionSegment| s.conversion_amount),
        ("conversion_tax", |s: &ConversionSegment| s.conversion_tax),
        ("synthetic_roth_contribution", |s: &ConversionSegment| s.synthetic_roth_contribution),
        ("tax_rate_spread_amount", |s: &ConversionSegment| s.tax_rate_spread_amount),
        ("total_after_tax_payout", |s: &ConversionSegment| s.total_after_tax_payout),
    ];

    let mut mismatches = Vec::new();
    for (k, row) in cumulative.iter().enumerate() {
        let parts = &isolated[..(k + 1).min(isolated.len())];
        for (field, value) in fields {
            let sum: f64 = parts.iter().map(value).sum();
            let magnitude: f64 = parts.iter().map(|p| value(p).abs()).sum();
            let cum = value(row);
            let scale = cum.abs().max(magnitude).max(1.0);

            if (cum - sum).abs() > RECONCILIATION_TOLERANCE * scale {
                mismatches.push(EngineError::DecompositionMismatch {
                    group_num: row.group_num,
                    field,
                    cumulative: cum,
                    parts: sum,
                });
            }
        }
    }
    mismatches
}

/// Fail loudly in debug builds; log and keep the best-effort result otherwise
fn reconcile(cumulative: &[ConversionSegment], isolated: &[ConversionSegment]) -> Result<()> {
    let mismatches = decomposition_mismatches(cumulative, isolated);
    if mismatches.is_empty() {
        return Ok(());
    }

    for mismatch in &mismatches {
        log::error!("{}", mismatch);
    }
    if cfg!(debug_assertions) {
        if let Some(first) = mismatches.into_iter().next() {
            return Err(first);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::IrrSolution;
    use crate::profile::FilingStatus;
    use approx::assert_relative_eq;

    fn household(trad: f64) -> HouseholdProfile {
        HouseholdProfile::new(
            trad,
            0.0,
            25_000.0,
            FilingStatus::MarriedFilingJointly,
            30,
            0.05,
            0.015,
            0.015,
        )
    }

    #[test]
    fn test_run_produces_all_tables() {
        let result = RothEngine::default().run(&household(1_000_000.0)).unwrap();

        assert!((result.schedule.annual_distribution - 65_051.0).abs() < 1.0);
        assert_eq!(result.records.len(), 30);
        assert_eq!(result.cumulative.len(), 8);
        assert_eq!(result.isolated.len(), 8);
        assert_relative_eq!(result.cumulative[7].conversion_amount, 1_000_000.0, max_relative = 1e-12);
        assert_eq!(result.isolated[0].kind, SegmentKind::Isolated);
        assert_eq!(result.cumulative[0].label(), "Conversion 1");
        assert_eq!(result.isolated[2].label(), "Part 3");
    }

    #[test]
    fn test_million_dollar_twelve_percent_part() {
        let result = RothEngine::default().run(&household(1_000_000.0)).unwrap();
        let part = &result.isolated[2];

        assert_eq!(part.tax_bracket_rate, 0.12);
        assert_relative_eq!(part.conversion_amount, 73_100.0, max_relative = 1e-12);
        assert_relative_eq!(part.conversion_tax, 8_772.0, max_relative = 1e-9);
        assert!((part.distribution_tax_rate - 0.12).abs() < 1e-6, "t_D = {}", part.distribution_tax_rate);
        assert!(part.tax_rate_spread_amount.abs() < 1.0);
        assert!((part.irr.rate().unwrap() - 0.05).abs() < 1e-4);
    }

    #[test]
    fn test_social_security_zone_pair() {
        // Smaller Traditional balance, same benefit: the 12% part is taxed
        // at well above 12% on distribution
        let engine = RothEngine::default();
        let million = engine.run(&household(1_000_000.0)).unwrap();
        let smaller = engine.run(&household(750_000.0)).unwrap();

        let part = &smaller.isolated[2];
        assert_eq!(part.tax_bracket_rate, 0.12);
        assert_relative_eq!(part.conversion_amount, 73_100.0, max_relative = 1e-12);
        assert!((part.distribution_tax_rate - 0.1895).abs() < 0.002, "t_D = {}", part.distribution_tax_rate);
        assert_relative_eq!(part.total_after_tax_payout, 27_030.0, max_relative = 0.01);
        assert!(part.tax_rate_spread_amount > 0.0);
        let irr = part.irr.rate().unwrap();
        assert!((irr - 0.10).abs() < 0.005, "irr = {}", irr);

        assert!(part.distribution_tax_rate > million.isolated[2].distribution_tax_rate);
        assert!(irr > million.isolated[2].irr.rate().unwrap());

        // Deterministic
        let again = engine.run(&household(750_000.0)).unwrap();
        assert_eq!(again.isolated, smaller.isolated);
    }

    #[test]
    fn test_million_dollar_twenty_two_percent_part() {
        let result = RothEngine::default().run(&household(1_000_000.0)).unwrap();
        let part = &result.isolated[3];

        assert_eq!(part.tax_bracket_rate, 0.22);
        assert_relative_eq!(part.conversion_amount, 109_750.0, max_relative = 1e-12);
        assert!((part.distribution_tax_rate - 0.1557).abs() < 0.001, "t_D = {}", part.distribution_tax_rate);
        assert_relative_eq!(part.tax_rate_spread_amount, -13_776.0, max_relative = 0.01);
    }

    #[test]
    fn test_unconverged_part_is_still_reported() {
        // Part 8 removes distributions that were never taxed: no payout, no IRR
        let result = RothEngine::default().run(&household(1_000_000.0)).unwrap();
        let last = &result.isolated[7];

        assert_eq!(last.label(), "Part 8");
        assert!(last.conversion_tax > 0.0);
        assert!(last.total_after_tax_payout.abs() < 1e-6);
        assert_eq!(last.irr, IrrSolution::NotConverged);
        assert_eq!(last.irr.to_string(), "N/A");

        for part in &result.isolated[..7] {
            assert!(part.irr.is_converged(), "{} irr {}", part.label(), part.irr);
        }
    }

    #[test]
    fn test_parts_reconcile_to_cumulative() {
        let engine = RothEngine::default();
        for trad in [100_000.0, 400_000.0, 750_000.0, 1_000_000.0, 3_000_000.0] {
            let result = engine.run(&household(trad)).unwrap();
            assert!(decomposition_mismatches(&result.cumulative, &result.isolated).is_empty());

            for segment in result.cumulative.iter().chain(&result.isolated) {
                assert_eq!(
                    segment.total_after_tax_payout,
                    segment.synthetic_roth_contribution + segment.tax_rate_spread_amount
                );
            }
        }
    }

    #[test]
    fn test_zero_bracket_sentinels() {
        let result = RothEngine::default().run(&household(1_000_000.0)).unwrap();

        for segment in [&result.cumulative[0], &result.isolated[0]] {
            assert_eq!(segment.conversion_tax, 0.0);
            assert_eq!(segment.return_multiple, 100.0);
            assert_eq!(segment.irr, IrrSolution::Converged(1.0));
        }
    }

    #[test]
    fn test_detects_tampered_decomposition() {
        let result = RothEngine::default().run(&household(1_000_000.0)).unwrap();
        let mut isolated = result.isolated.clone();
        isolated[3].conversion_tax += 50.0;

        let mismatches = decomposition_mismatches(&result.cumulative, &isolated);
        // Rows 4..=8 all include the tampered part
        assert!(mismatches.len() >= 5);
        assert!(matches!(
            mismatches[0],
            EngineError::DecompositionMismatch { group_num: 4, field: "conversion_tax", .. }
        ));
    }

    #[test]
    fn test_invalid_profile_fails_fast() {
        let mut profile = household(1_000_000.0);
        profile.life_years = 0;
        assert!(matches!(
            RothEngine::default().run(&profile),
            Err(EngineError::InvalidHorizon(0))
        ));
    }

    #[test]
    fn test_out_of_range_timeline_is_rejected() {
        let csv = "\
trad_savings,soc_sec_benefit,filing_status,life_years,return_assum,inflation_assum,soc_sec_growth_assum,start_age,years_until_start
1000000,25000,M,30,0.05,0.015,0.015,62,4294967295
";
        let profiles = crate::profile::load_profiles_from_reader(csv.as_bytes()).unwrap();
        assert!(matches!(
            RothEngine::default().run(&profiles[0]),
            Err(EngineError::InvalidProfile { field: "years_until_start", .. })
        ));
    }

    #[test]
    fn test_zero_return_run() {
        let mut profile = household(500_000.0);
        profile.return_assum = 0.0;
        let result = RothEngine::default().run(&profile).unwrap();

        assert_relative_eq!(result.schedule.annuity_factor_multiple, 1.0, max_relative = 1e-12);
        assert!(decomposition_mismatches(&result.cumulative, &result.isolated).is_empty());
    }

    #[test]
    fn test_run_batch() {
        let engine = RothEngine::default();
        let mut bad = household(1_000_000.0);
        bad.trad_savings = -5.0;
        let profiles = vec![household(500_000.0), bad, household(1_500_000.0)];

        let results = engine.run_batch(&profiles);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(EngineError::InvalidProfile { .. })));
        assert!(results[2].as_ref().unwrap().cumulative.len() > results[0].as_ref().unwrap().cumulative.len());
    }
}
