//! Partition of the Traditional balance into conversion groups by bracket

use serde::{Deserialize, Serialize};

use crate::tax::TaxBracketTable;

/// Cumulative conversion that fills every bracket up to `group_num`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionGroup {
    /// 1 = standard deduction (0% bracket)
    pub group_num: u32,
    /// Nominal rate of the bracket this group fills
    pub bracket_rate: f64,
    /// Total converted through this group
    pub cumulative_amount: f64,
    /// Tax on the cumulative amount converted in a year with no other income
    pub cumulative_tax: f64,
}

impl ConversionGroup {
    /// Amount and tax added by this group over the previous one
    pub fn isolated_from(&self, previous: Option<&ConversionGroup>) -> (f64, f64) {
        match previous {
            Some(prev) => (
                self.cumulative_amount - prev.cumulative_amount,
                self.cumulative_tax - prev.cumulative_tax,
            ),
            None => (self.cumulative_amount, self.cumulative_tax),
        }
    }
}

/// Builds conversion groups from the conversion year's bracket table
#[derive(Debug, Clone, Copy)]
pub struct ConversionBracketBuilder<'a> {
    table: &'a TaxBracketTable,
}

impl<'a> ConversionBracketBuilder<'a> {
    pub fn new(table: &'a TaxBracketTable) -> Self {
        Self { table }
    }

    /// Gross-income ceilings: the standard deduction, each bounded bracket
    /// top, then the unbounded top bracket
    fn ceilings(&self) -> Vec<(f64, Option<f64>)> {
        let mut ceilings = Vec::with_capacity(self.table.brackets.len() + 1);
        ceilings.push((0.0, Some(self.table.standard_deduction)));
        ceilings.extend(self.table.gross_thresholds().map(|(rate, top)| (rate, Some(top))));
        ceilings.push((self.table.top_rate(), None));
        ceilings
    }

    /// Fill each bracket while the balance exceeds its ceiling; the group
    /// containing the balance is truncated to it and ends the sequence
    pub fn build(&self, trad_savings: f64) -> Vec<ConversionGroup> {
        let mut groups: Vec<ConversionGroup> = Vec::new();
        if trad_savings <= 0.0 {
            return groups;
        }

        let mut converted = 0.0;
        for (rate, ceiling) in self.ceilings() {
            let (amount, last) = match ceiling {
                Some(top) if trad_savings > top => (top, false),
                _ => (trad_savings, true),
            };

            // Zero-width bracket (e.g. no standard deduction)
            if amount > converted {
                groups.push(ConversionGroup {
                    group_num: groups.len() as u32 + 1,
                    bracket_rate: rate,
                    cumulative_amount: amount,
                    cumulative_tax: self.table.conversion_tax(amount),
                });
                converted = amount;
            }

            if last {
                break;
            }
        }

        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::FilingStatus;
    use crate::tax::{TaxBracketProjector, TaxTables};
    use approx::assert_relative_eq;

    fn mfj_table() -> TaxBracketTable {
        let tables = TaxTables::default_2025();
        TaxBracketProjector::new(&tables, 0.015)
            .unwrap()
            .project(FilingStatus::MarriedFilingJointly, 0)
            .unwrap()
    }

    #[test]
    fn test_million_dollar_groups() {
        let table = mfj_table();
        let groups = ConversionBracketBuilder::new(&table).build(1_000_000.0);

        // 0%, 10%, 12%, 22%, 24%, 32%, 35%, then the remainder at 37%
        assert_eq!(groups.len(), 8);
        assert_eq!(groups[0].cumulative_amount, 31_500.0);
        assert_eq!(groups[0].cumulative_tax, 0.0);
        assert_eq!(groups[1].cumulative_amount, 55_350.0);
        assert_eq!(groups[2].cumulative_amount, 128_450.0);
        assert_eq!(groups[7].cumulative_amount, 1_000_000.0);
        assert_eq!(groups[7].bracket_rate, 0.37);

        let (amount, tax) = groups[2].isolated_from(Some(&groups[1]));
        assert_relative_eq!(amount, 73_100.0, max_relative = 1e-12);
        assert_relative_eq!(tax, 8_772.0, max_relative = 1e-9);
    }

    #[test]
    fn test_truncated_group() {
        let table = mfj_table();
        let groups = ConversionBracketBuilder::new(&table).build(100_000.0);

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[2].bracket_rate, 0.12);
        assert_eq!(groups[2].cumulative_amount, 100_000.0);

        let (amount, tax) = groups[2].isolated_from(Some(&groups[1]));
        assert_relative_eq!(tax / amount, 0.12, max_relative = 1e-9);
    }

    #[test]
    fn test_balance_within_standard_deduction() {
        let table = mfj_table();
        let groups = ConversionBracketBuilder::new(&table).build(20_000.0);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].cumulative_amount, 20_000.0);
        assert_eq!(groups[0].isolated_from(None), (20_000.0, 0.0));
    }

    #[test]
    fn test_balance_on_threshold_ends_groups() {
        let table = mfj_table();
        let groups = ConversionBracketBuilder::new(&table).build(55_350.0);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].cumulative_amount, 55_350.0);
    }

    #[test]
    fn test_cumulative_amounts_increase() {
        let table = mfj_table();
        let groups = ConversionBracketBuilder::new(&table).build(5_000_000.0);

        assert_eq!(groups.len(), 8);
        for pair in groups.windows(2) {
            assert!(pair[1].cumulative_amount > pair[0].cumulative_amount);
            assert!(pair[1].cumulative_tax > pair[0].cumulative_tax);
            assert_eq!(pair[1].group_num, pair[0].group_num + 1);
        }
    }
}
