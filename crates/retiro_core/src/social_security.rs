//! Social Security claiming rules.
//!
//! Full retirement age by birth year, early-claim reductions and delayed
//! credits for self benefits, the spousal top-up and its separate reduction
//! schedule. Individuals born on the 1st or 2nd of a month are treated as a
//! month older, consistent with SSA age rules.

use crate::error::{PlanError, Result};

/// Full retirement age in fractional years for a birth year.
///
/// Birth years 1960 and later have an FRA of 67; earlier years step down by
/// two months per year back to 66.
#[must_use]
pub fn full_retirement_age(yob: i32) -> f64 {
    if yob >= 1960 {
        67.0
    } else {
        let months = (2 * (yob - 1954)).max(0) as f64;
        66.0 + months / 12.0
    }
}

/// Maximum spousal top-up for each individual:
/// `max(0, 0.5 * PIA_spouse - PIA_self)`.
pub fn spousal_benefits(pias: &[f64]) -> Result<Vec<f64>> {
    match pias.len() {
        1 => Ok(vec![0.0]),
        2 => Ok(vec![
            (0.5 * pias[1] - pias[0]).max(0.0),
            (0.5 * pias[0] - pias[1]).max(0.0),
        ]),
        n => Err(PlanError::config(format!(
            "PIAs array cannot have {n} entries"
        ))),
    }
}

/// Factor applied to the PIA for a self benefit claimed at `claim_age`.
///
/// Reduction of 20% over the first 36 months before FRA, then 5% per
/// further year; increase of 8% per year of delay past FRA.
pub fn self_factor(fra: f64, claim_age: f64, born_on_first_days: bool) -> Result<f64> {
    if !(62.0..=70.0).contains(&claim_age) {
        return Err(PlanError::config(format!(
            "claiming age {claim_age} out of range"
        )));
    }
    let offset = if born_on_first_days { 1.0 / 12.0 } else { 0.0 };
    let diff = fra - (claim_age + offset);
    let factor = if diff <= 0.0 {
        1.0 - 0.08 * diff
    } else if diff <= 3.0 {
        1.0 - 0.066_666_67 * diff
    } else {
        0.8 - 0.05 * (diff - 3.0)
    };
    Ok(factor)
}

/// Factor applied to the spousal top-up for a claim at `claim_age`.
///
/// Reduction of 25% over the first 36 months before FRA, then 5% per
/// further year. No delayed credit past FRA.
pub fn spousal_factor(fra: f64, claim_age: f64, born_on_first_days: bool) -> Result<f64> {
    if claim_age < 62.0 {
        return Err(PlanError::config(format!(
            "claiming age {claim_age} out of range"
        )));
    }
    let offset = if born_on_first_days { 1.0 / 12.0 } else { 0.0 };
    let diff = fra - (claim_age + offset);
    let factor = if diff <= 0.0 {
        1.0
    } else if diff <= 3.0 {
        1.0 - 0.083_333_33 * diff
    } else {
        0.75 - 0.05 * (diff - 3.0)
    };
    Ok(factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fra_by_birth_year() {
        assert_eq!(full_retirement_age(1965), 67.0);
        assert_eq!(full_retirement_age(1960), 67.0);
        assert!((full_retirement_age(1957) - 66.5).abs() < 1e-12);
        assert_eq!(full_retirement_age(1950), 66.0);
    }

    #[test]
    fn self_factor_at_fra_is_one() {
        assert!((self_factor(67.0, 67.0, false).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn self_factor_early_and_delayed() {
        // Claiming 3 years early: 20% reduction.
        assert!((self_factor(67.0, 64.0, false).unwrap() - 0.8).abs() < 1e-6);
        // Claiming at 62 with FRA 67: 70%.
        assert!((self_factor(67.0, 62.0, false).unwrap() - 0.70).abs() < 1e-6);
        // Delaying to 70 with FRA 67: 124%.
        assert!((self_factor(67.0, 70.0, false).unwrap() - 1.24).abs() < 1e-6);
    }

    #[test]
    fn spousal_factor_no_delayed_credit() {
        assert_eq!(spousal_factor(67.0, 70.0, false).unwrap(), 1.0);
        assert!((spousal_factor(67.0, 64.0, false).unwrap() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn spousal_benefit_top_up() {
        let b = spousal_benefits(&[800.0, 2400.0]).unwrap();
        assert!((b[0] - 400.0).abs() < 1e-12);
        assert_eq!(b[1], 0.0);
    }

    #[test]
    fn born_on_first_days_shifts_age() {
        let a = self_factor(67.0, 66.0, false).unwrap();
        let b = self_factor(67.0, 66.0, true).unwrap();
        assert!(b > a);
    }
}
