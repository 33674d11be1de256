//! Baseline retirement projection (no conversion)

use crate::error::Result;
use crate::profile::HouseholdProfile;
use crate::tax::{SocialSecurityTaxRule, TaxBracketProjector, TaxBracketTable, TaxTables};
use super::annuity::DistributionSchedule;
use super::records::{RetirementProjection, RetirementYearRecord};
use super::state::YearState;

/// Projects year-by-year income and federal tax for a household.
///
/// Bracket tables for every year of the horizon are built once on
/// construction, so [`project`](Self::project) can be called repeatedly with
/// different starting balances (one call per conversion group).
#[derive(Debug, Clone)]
pub struct PreConversionProjector {
    profile: HouseholdProfile,
    schedule: DistributionSchedule,
    current_table: TaxBracketTable,
    year_tables: Vec<TaxBracketTable>,
    ss_rule: SocialSecurityTaxRule,
    base_year: i32,
}

impl PreConversionProjector {
    /// Validate the profile and prepare the horizon's bracket tables
    pub fn new(profile: &HouseholdProfile, tables: &TaxTables) -> Result<Self> {
        profile.validate()?;

        let schedule =
            DistributionSchedule::calculate(profile.trad_savings, profile.return_assum, profile.life_years)?;
        let brackets = TaxBracketProjector::new(tables, profile.inflation_assum)?;
        let status = profile.filing_status;

        let current_table = brackets.project(status, 0)?;
        let year_tables = (0..profile.life_years)
            .map(|i| brackets.project(status, profile.table_year_offset(i)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            profile: profile.clone(),
            schedule,
            current_table,
            year_tables,
            ss_rule: SocialSecurityTaxRule::new(brackets.ss_thresholds(status)?),
            base_year: brackets.base_year(status)?,
        })
    }

    pub fn schedule(&self) -> &DistributionSchedule {
        &self.schedule
    }

    /// Unindexed bracket table for the conversion year
    pub fn current_year_table(&self) -> &TaxBracketTable {
        &self.current_table
    }

    /// Projection of the household's actual balances
    pub fn baseline(&self) -> RetirementProjection {
        self.project(self.profile.trad_savings, self.profile.roth_savings)
    }

    /// Projection with the given starting balances; all other inputs from the profile
    pub fn project(&self, trad_savings: f64, roth_savings: f64) -> RetirementProjection {
        let trad_distribution = self.schedule.distribution_for(trad_savings);
        let roth_distribution = self.schedule.distribution_for(roth_savings);
        let return_rate = self.profile.return_assum;
        let ss_growth = self.profile.soc_sec_growth_assum;

        let initial = YearState::initial(self.profile.soc_sec_benefit, trad_savings, roth_savings);
        let records = Vec::with_capacity(self.year_tables.len());

        let (_, records) = self.year_tables.iter().fold((initial, records), |(state, mut records), table| {
            records.push(self.project_year(&state, table, trad_distribution, roth_distribution));
            let next = state.advance(return_rate, ss_growth, trad_distribution, roth_distribution);
            (next, records)
        });

        RetirementProjection {
            trad_savings,
            roth_savings,
            records,
        }
    }

    fn project_year(
        &self,
        state: &YearState,
        table: &TaxBracketTable,
        trad_distribution: f64,
        roth_distribution: f64,
    ) -> RetirementYearRecord {
        let year = state.year_index;
        let age = self.profile.age_in_year(year);

        // Taxability of the benefit depends only on other income, so no iteration is needed
        let ss = self.ss_rule.evaluate(state.ss_benefit, trad_distribution);

        let standard_deduction = table.deduction_for_age(age);
        let taxable_income = (trad_distribution + ss.taxable_amount - standard_deduction).max(0.0);
        let federal_tax = table.tax_on_taxable_income(taxable_income);
        let marginal = table.marginal_rate(taxable_income);

        let return_rate = self.profile.return_assum;

        RetirementYearRecord {
            year_index: year,
            calendar_year: self.base_year + self.profile.table_year_offset(year) as i32,
            age,
            ss_benefit: state.ss_benefit,
            taxable_ss: ss.taxable_amount,
            pct_ss_taxed: ss.taxable_fraction,
            trad_distribution,
            roth_distribution,
            standard_deduction,
            taxable_income,
            federal_tax,
            marginal_trad_tax_rate: marginal,
            adjusted_marginal_tax_rate: ss.adjusted_marginal_rate(marginal),
            after_tax_cash_flow: state.ss_benefit + trad_distribution - federal_tax,
            after_tax_distribution: roth_distribution + trad_distribution - federal_tax,
            trad_balance: YearState::closing_balance(state.trad_balance, return_rate, trad_distribution),
            roth_balance: YearState::closing_balance(state.roth_balance, return_rate, roth_distribution),
        }
    }
}
