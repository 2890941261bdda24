//! Per-individual wages-and-contributions tables.
//!
//! Each individual carries one row per calendar year covering
//! `thisyear - 5 .. thisyear + horizon - 1`. The five years preceding the
//! plan exist for the Roth five-year maturation rule; once conditioned, they
//! are stored at the *tail* of the plan arrays and addressed with negative
//! offsets from the end. Missing years are filled with zeros; all columns
//! must be non-negative except big-ticket items, which are sign-bearing.

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};

/// One calendar year of anticipated wages, contributions, and events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContributionRow {
    pub year: i32,
    pub wages: f64,
    pub other_income: f64,
    pub taxable_ctrb: f64,
    pub ctrb_401k: f64,
    pub ctrb_roth_401k: f64,
    pub ctrb_ira: f64,
    pub ctrb_roth_ira: f64,
    pub roth_conversion: f64,
    pub big_ticket_items: f64,
}

impl ContributionRow {
    #[must_use]
    pub fn zero(year: i32) -> Self {
        Self {
            year,
            ..Self::default()
        }
    }

    fn check_non_negative(&self, name: &str) -> Result<()> {
        let fields = [
            ("wages", self.wages),
            ("other income", self.other_income),
            ("taxable ctrb", self.taxable_ctrb),
            ("401k ctrb", self.ctrb_401k),
            ("Roth 401k ctrb", self.ctrb_roth_401k),
            ("IRA ctrb", self.ctrb_ira),
            ("Roth IRA ctrb", self.ctrb_roth_ira),
            ("Roth conv", self.roth_conversion),
        ];
        for (field, value) in fields {
            if value < 0.0 {
                return Err(PlanError::config(format!(
                    "item '{field}' for {name} in year {} is < 0",
                    self.year
                )));
            }
        }
        Ok(())
    }
}

/// The conditioned table for one individual.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContributionsTable {
    pub name: String,
    pub rows: Vec<ContributionRow>,
}

impl ContributionsTable {
    #[must_use]
    pub fn new(name: impl Into<String>, rows: Vec<ContributionRow>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Restrict rows to `thisyear - 5 .. thisyear + horizon - 1`, fill
    /// missing years with zeros, drop duplicates, and validate signs.
    /// The result has exactly `horizon + 5` rows in year order.
    pub fn conditioned(&self, horizon: usize, this_year: i32) -> Result<Vec<ContributionRow>> {
        let first = this_year - 5;
        let last = this_year + horizon as i32 - 1;

        let mut out = Vec::with_capacity(horizon + 5);
        let mut missing = 0usize;
        for year in first..=last {
            match self.rows.iter().find(|r| r.year == year) {
                Some(row) => {
                    row.check_non_negative(&self.name)?;
                    out.push(*row);
                }
                None => {
                    missing += 1;
                    out.push(ContributionRow::zero(year));
                }
            }
        }
        if missing > 0 {
            log::debug!("added {missing} missing contribution years for {}", self.name);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditioning_fills_missing_years() {
        let table = ContributionsTable::new(
            "alex",
            vec![ContributionRow {
                year: 2030,
                wages: 50_000.0,
                ..Default::default()
            }],
        );
        let rows = table.conditioned(10, 2026).unwrap();
        assert_eq!(rows.len(), 15);
        assert_eq!(rows[0].year, 2021);
        assert_eq!(rows[14].year, 2035);
        assert_eq!(rows[9].wages, 50_000.0);
        assert_eq!(rows[8].wages, 0.0);
    }

    #[test]
    fn negative_contribution_rejected() {
        let table = ContributionsTable::new(
            "alex",
            vec![ContributionRow {
                year: 2026,
                ctrb_ira: -1.0,
                ..Default::default()
            }],
        );
        assert!(table.conditioned(5, 2026).is_err());
    }

    #[test]
    fn big_ticket_items_may_be_negative() {
        let table = ContributionsTable::new(
            "alex",
            vec![ContributionRow {
                year: 2027,
                big_ticket_items: -25_000.0,
                ..Default::default()
            }],
        );
        let rows = table.conditioned(5, 2026).unwrap();
        assert_eq!(rows[6].big_ticket_items, -25_000.0);
    }

    #[test]
    fn out_of_range_years_dropped() {
        let table = ContributionsTable::new(
            "alex",
            vec![
                ContributionRow {
                    year: 2010,
                    wages: 1.0,
                    ..Default::default()
                },
                ContributionRow {
                    year: 2090,
                    wages: 2.0,
                    ..Default::default()
                },
            ],
        );
        let rows = table.conditioned(5, 2026).unwrap();
        assert!(rows.iter().all(|r| r.wages == 0.0));
    }
}
