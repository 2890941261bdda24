//! Household debt service.
//!
//! Fixed-rate amortizing loans produce a constant annual payment stream
//! while active within the plan horizon, and a residual balance if they
//! outlive the plan.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DebtKind {
    Loan,
    Mortgage,
}

/// One fixed-rate amortizing debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    pub active: bool,
    pub name: String,
    pub kind: DebtKind,
    /// Origination year.
    pub year: i32,
    /// Term in years.
    pub term: i32,
    /// Original principal.
    pub amount: f64,
    /// Annual interest rate in percent.
    pub rate: f64,
}

/// Constant monthly payment for a fixed-rate amortizing loan.
#[must_use]
pub fn monthly_payment(principal: f64, annual_rate: f64, term_years: i32) -> f64 {
    if term_years <= 0 || annual_rate < 0.0 || principal <= 0.0 {
        return 0.0;
    }
    let monthly_rate = annual_rate / 100.0 / 12.0;
    let num_payments = (term_years * 12) as f64;
    if monthly_rate == 0.0 {
        return principal / num_payments;
    }
    let fac = (1.0 + monthly_rate).powf(num_payments);
    principal * (monthly_rate * fac) / (fac - 1.0)
}

#[must_use]
pub fn annual_payment(principal: f64, annual_rate: f64, term_years: i32) -> f64 {
    12.0 * monthly_payment(principal, annual_rate, term_years)
}

/// Remaining balance after `years_elapsed` years of payments.
#[must_use]
pub fn remaining_balance(principal: f64, annual_rate: f64, term_years: i32, years_elapsed: i32) -> f64 {
    if years_elapsed <= 0 {
        return principal;
    }
    if years_elapsed >= term_years {
        return 0.0;
    }
    let monthly_rate = annual_rate / 100.0 / 12.0;
    let num_payments = (term_years * 12) as f64;
    let payments_made = (years_elapsed * 12) as f64;
    if monthly_rate == 0.0 {
        return principal * (1.0 - payments_made / num_payments);
    }
    let fac = 1.0 + monthly_rate;
    let remaining =
        principal * (fac.powf(num_payments) - fac.powf(payments_made)) / (fac.powf(num_payments) - 1.0);
    remaining.max(0.0)
}

/// Annual debt-service outflows for each plan year.
#[must_use]
pub fn payments_array(debts: &[Debt], n_n: usize, this_year: i32) -> Vec<f64> {
    let mut payments = vec![0.0; n_n];
    for debt in debts.iter().filter(|d| d.active) {
        let end_year = debt.year + debt.term;
        let payment = annual_payment(debt.amount, debt.rate, debt.term);
        for (n, p) in payments.iter_mut().enumerate() {
            let year = this_year + n as i32;
            if debt.year <= year && year < end_year {
                *p += payment;
            }
        }
    }
    payments
}

/// Total balance still owed at the end of the plan horizon.
#[must_use]
pub fn residual_balance(debts: &[Debt], n_n: usize, this_year: i32) -> f64 {
    let end_year = this_year + n_n as i32 - 1;
    debts
        .iter()
        .filter(|d| d.active)
        .filter(|d| d.year <= end_year && end_year < d.year + d.term)
        .map(|d| remaining_balance(d.amount, d.rate, d.term, end_year - d.year + 1))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monthly_payment_standard_mortgage() {
        // $300k at 4.5% over 30 years: about $1,520/month.
        let p = monthly_payment(300_000.0, 4.5, 30);
        assert!((p - 1_520.06).abs() < 1.0, "got {p}");
    }

    #[test]
    fn zero_rate_is_linear() {
        let p = monthly_payment(120_000.0, 0.0, 10);
        assert!((p - 1_000.0).abs() < 1e-9);
        let r = remaining_balance(120_000.0, 0.0, 10, 4);
        assert!((r - 72_000.0).abs() < 1e-9);
    }

    #[test]
    fn balance_reaches_zero_at_term() {
        assert_eq!(remaining_balance(100_000.0, 5.0, 15, 15), 0.0);
        assert_eq!(remaining_balance(100_000.0, 5.0, 15, 0), 100_000.0);
    }

    #[test]
    fn payments_only_while_active() {
        let debts = vec![Debt {
            active: true,
            name: "car".into(),
            kind: DebtKind::Loan,
            year: 2028,
            term: 3,
            amount: 30_000.0,
            rate: 6.0,
        }];
        let p = payments_array(&debts, 8, 2026);
        assert_eq!(p[0], 0.0);
        assert!(p[2] > 0.0);
        assert!(p[4] > 0.0);
        assert_eq!(p[5], 0.0);
    }

    #[test]
    fn inactive_debts_ignored() {
        let debts = vec![Debt {
            active: false,
            name: "old".into(),
            kind: DebtKind::Mortgage,
            year: 2026,
            term: 30,
            amount: 400_000.0,
            rate: 4.0,
        }];
        assert!(payments_array(&debts, 10, 2026).iter().all(|&v| v == 0.0));
        assert_eq!(residual_balance(&debts, 10, 2026), 0.0);
    }

    #[test]
    fn residual_balance_for_outliving_loan() {
        let debts = vec![Debt {
            active: true,
            name: "house".into(),
            kind: DebtKind::Mortgage,
            year: 2026,
            term: 30,
            amount: 400_000.0,
            rate: 4.0,
        }];
        let residual = residual_balance(&debts, 10, 2026);
        assert!(residual > 0.0 && residual < 400_000.0);
    }
}
