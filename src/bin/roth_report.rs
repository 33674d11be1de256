//! Print distribution, retirement projection, and conversion tables
//!
//! Either describe one household with flags or pass a profile CSV for a
//! parallel batch. Set RUST_LOG=info (or debug) for run diagnostics.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::Parser;
use roth_engine::profile::load_profiles;
use roth_engine::{ConversionSegment, EngineResult, FilingStatus, HouseholdProfile, RothEngine};

#[derive(Parser, Debug)]
#[command(name = "roth_report")]
#[command(about = "Retirement distribution and Roth conversion report")]
struct Args {
    /// Profile CSV for a batch run (overrides the household flags)
    #[arg(long)]
    profiles: Option<PathBuf>,

    /// Tax table directory (tax_brackets.csv, standard_deductions.csv, ss_thresholds.csv)
    #[arg(long)]
    tables: Option<PathBuf>,

    /// Traditional savings
    #[arg(long, default_value = "1000000")]
    trad: f64,

    /// Roth savings
    #[arg(long, default_value = "0")]
    roth: f64,

    /// Annual Social Security benefit in today's dollars
    #[arg(long, default_value = "25000")]
    ss: f64,

    /// Filing status: S, M or H
    #[arg(long, default_value = "M")]
    status: String,

    /// Years of distributions
    #[arg(long, default_value = "30")]
    years: u32,

    #[arg(long = "return", default_value = "0.05")]
    return_assum: f64,

    #[arg(long, default_value = "0.015")]
    inflation: f64,

    #[arg(long, default_value = "0.015")]
    ss_growth: f64,

    /// Birth date (YYYY-MM-DD); sets the retirement timeline with --start-year
    #[arg(long)]
    birth_date: Option<NaiveDate>,

    /// Calendar year of the first distribution (default: next year)
    #[arg(long)]
    start_year: Option<i32>,

    /// Print JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Number of projection years to print
    #[arg(long, default_value = "10")]
    show_years: usize,
}

/// Whole years of age on `date`; the current year counts once the birthday has passed
fn age_on(birth_date: NaiveDate, date: NaiveDate) -> i32 {
    let before_birthday = (date.month(), date.day()) < (birth_date.month(), birth_date.day());
    date.year() - birth_date.year() - i32::from(before_birthday)
}

fn household(args: &Args, engine: &RothEngine) -> Result<HouseholdProfile> {
    let status: FilingStatus = args.status.parse()?;
    let mut profile = HouseholdProfile::new(
        args.trad,
        args.roth,
        args.ss,
        status,
        args.years,
        args.return_assum,
        args.inflation,
        args.ss_growth,
    );

    if let Some(birth_date) = args.birth_date {
        let base_year = engine.tables().for_status(status)?.year;
        let today = Local::now().date_naive();
        let start_year = args.start_year.unwrap_or(today.year() + 1);
        if start_year < base_year {
            bail!("start year {start_year} is before the tax table year {base_year}");
        }
        let start_age = age_on(birth_date, today) + (start_year - today.year());
        if start_age < 0 {
            bail!("birth date {birth_date} is after the start year {start_year}");
        }
        profile = profile.with_timeline(start_age as u32, (start_year - base_year) as u32);
    }

    Ok(profile)
}

fn print_segments(title: &str, segments: &[ConversionSegment]) {
    println!("\n{title}");
    println!(
        "{:<14} {:>7} {:>12} {:>10} {:>7} {:>7} {:>12} {:>12} {:>12} {:>8} {:>8} {:>8}",
        "", "Bracket", "Amount", "Tax", "t_C", "t_D", "Synthetic", "Spread", "Payout", "Multiple", "IRR", "Duration"
    );
    println!("{}", "-".repeat(130));
    for s in segments {
        println!(
            "{:<14} {:>6.1}% {:>12.0} {:>10.0} {:>6.2}% {:>6.2}% {:>12.0} {:>12.0} {:>12.0} {:>8.2} {:>8} {:>8.1}",
            s.label(),
            s.tax_bracket_rate * 100.0,
            s.conversion_amount,
            s.conversion_tax,
            s.conv_tax_rate * 100.0,
            s.distribution_tax_rate * 100.0,
            s.synthetic_roth_contribution,
            s.tax_rate_spread_amount,
            s.total_after_tax_payout,
            s.return_multiple,
            s.irr.to_string(),
            s.duration_years,
        );
    }
}

fn print_report(result: &EngineResult, show_years: usize) {
    let profile = &result.profile;
    let schedule = &result.schedule;

    println!(
        "Household: trad ${:.0}, roth ${:.0}, SS ${:.0}, {}",
        profile.trad_savings, profile.roth_savings, profile.soc_sec_benefit, profile.filing_status
    );
    println!(
        "Distribution: ${:.2}/yr for {} years (${:.0} total) at {:.2}%  M = {:.4}  base duration = {:.2} years",
        schedule.annual_distribution,
        schedule.horizon_years,
        schedule.total_distributions(),
        schedule.return_rate * 100.0,
        schedule.annuity_factor_multiple,
        schedule.base_duration
    );

    println!(
        "\n{:>4} {:>4} {:>3} {:>10} {:>8} {:>10} {:>10} {:>10} {:>10} {:>6} {:>6}",
        "Year", "Cal", "Age", "SS", "SS Tax%", "Trad", "Roth", "Fed Tax", "After Tax", "MTR", "Adj"
    );
    println!("{}", "-".repeat(95));
    for r in result.records.iter().take(show_years) {
        println!(
            "{:>4} {:>4} {:>3} {:>10.0} {:>7.1}% {:>10.0} {:>10.0} {:>10.0} {:>10.0} {:>5.1}% {:>5.1}%",
            r.year_index + 1,
            r.calendar_year,
            r.age,
            r.ss_benefit,
            r.pct_ss_taxed * 100.0,
            r.trad_distribution,
            r.roth_distribution,
            r.federal_tax,
            r.after_tax_cash_flow,
            r.marginal_trad_tax_rate * 100.0,
            r.adjusted_marginal_tax_rate * 100.0,
        );
    }

    print_segments("Conversions (cumulative)", &result.cumulative);
    print_segments("Parts (isolated)", &result.isolated);
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let engine = match &args.tables {
        Some(dir) => RothEngine::from_csv_path(dir)
            .with_context(|| format!("loading tax tables from {}", dir.display()))?,
        None => RothEngine::default(),
    };

    let profiles = match &args.profiles {
        Some(path) => load_profiles(path).with_context(|| format!("loading profiles from {}", path.display()))?,
        None => vec![household(&args, &engine)?],
    };

    let mut results = Vec::with_capacity(profiles.len());
    for (i, result) in engine.run_batch(&profiles).into_iter().enumerate() {
        match result {
            Ok(result) => results.push(result),
            Err(e) => eprintln!("profile {}: {}", i + 1, e),
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        if i > 0 {
            println!("\n{}", "=".repeat(130));
        }
        print_report(result, args.show_years);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_counts_birthday() {
        let birth = date(1963, 12, 15);
        assert_eq!(age_on(birth, date(2025, 10, 19)), 61);
        assert_eq!(age_on(birth, date(2025, 12, 14)), 61);
        assert_eq!(age_on(birth, date(2025, 12, 15)), 62);
        assert_eq!(age_on(date(1963, 1, 2), date(2025, 10, 19)), 62);
    }

    #[test]
    fn test_leap_day_birthday() {
        let birth = date(1960, 2, 29);
        assert_eq!(age_on(birth, date(2025, 2, 28)), 64);
        assert_eq!(age_on(birth, date(2025, 3, 1)), 65);
    }
}
