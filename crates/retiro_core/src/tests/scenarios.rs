//! End-to-end optimization scenarios with closed-form expectations.

use super::*;
use crate::plan::{Objective, Plan};
use crate::profile::ProfileShape;
use crate::results::CaseStatus;

/// Simple tax-deferred annuity: $3,000 at zero rates over 10 years spends
/// $300/year with no tax (absorbed by the standard deduction).
#[test]
fn simple_tax_deferred_annuity() {
    let plan = single_plan(60, 10, [0.0, 3_000.0, 0.0], zero_rates(), &all_cash());
    let mut options = basic_options();
    options.bequest = Some(0.0);

    let solved = plan.solve(Objective::MaxSpending, &options).unwrap();
    assert_eq!(solved.status, CaseStatus::Solved);
    assert!(
        (solved.basis - 300.0).abs() < 0.05,
        "basis {} != 300",
        solved.basis
    );
    assert!(solved.bequest < 1e-6, "bequest {}", solved.bequest);
    // No tax: everything fits under the standard deduction.
    assert!(solved.ordinary_tax_n.iter().sum::<f64>() < 1e-6);
}

/// Tax-free growth: an untouched Roth compounds to the full bequest.
#[test]
fn tax_free_growth_max_bequest() {
    let plan = single_plan(60, 12, [0.0, 0.0, 120_000.0], tnotes_4pct(), &all_tnotes());
    let mut options = basic_options();
    options.net_spending = Some(0.0);

    let solved = plan.solve(Objective::MaxBequest, &options).unwrap();
    let expected = 120_000.0 * 1.04f64.powi(12);
    assert!(
        (solved.bequest - expected).abs() / expected < 1e-3,
        "bequest {} != {expected}",
        solved.bequest
    );
    assert!(solved.basis.abs() < 1e-6);
    assert!(solved.net_spending_n.iter().all(|&g| g.abs() < 0.02));
}

/// Annuity formula: spending down a tax-free account at 4% matches the
/// start-of-year annuity payment.
#[test]
fn tax_free_annuity_max_spending() {
    let plan = single_plan(60, 12, [0.0, 0.0, 120_000.0], tnotes_4pct(), &all_tnotes());
    let mut options = basic_options();
    options.bequest = Some(0.0);

    let solved = plan.solve(Objective::MaxSpending, &options).unwrap();
    let expected = annuity_due_payment(120_000.0, 0.04, 12);
    assert!(
        (solved.basis - expected).abs() < 1.0,
        "basis {} != {expected}",
        solved.basis
    );
    assert!(solved.bequest < 1e-6);
}

/// Income below the standard deduction is never taxed: the deduction
/// variable absorbs the whole withdrawal.
#[test]
fn small_income_below_standard_deduction() {
    let plan = single_plan(60, 10, [0.0, 40_000.0, 0.0], zero_rates(), &all_cash());
    let mut options = basic_options();
    options.bequest = Some(0.0);

    let solved = plan.solve(Objective::MaxSpending, &options).unwrap();
    assert!(
        (solved.basis - 4_000.0).abs() < 0.05,
        "basis {}",
        solved.basis
    );
    assert!(solved.ordinary_tax_n.iter().sum::<f64>() < 1e-6);
    // The deduction variable carries the income.
    assert!(solved.deduction_used_n[0] > 3_999.0);
    assert!(solved.bracket_fill_tn.data().iter().sum::<f64>() < 1e-6);
}

/// Married couple with unequal horizons and full spousal transfer: total
/// spending matches the single-pot annuity over the longer horizon.
#[test]
fn spousal_transfer_combines_balances() {
    let dob0 = dob(60);
    let dob1 = dob(63);
    let mut plan = Plan::new(
        &["ana", "ben"],
        &[dob0.as_str(), dob1.as_str()],
        &[expectancy_for(60, 12), expectancy_for(63, 10)],
        "couple",
    )
    .unwrap();
    plan.set_rates(tnotes_4pct()).unwrap();
    plan.set_account_balances(
        &[0.0, 0.0],
        &[60_000.0, 60_000.0],
        &[0.0, 0.0],
        Some("01-01"),
    )
    .unwrap();
    plan.set_allocation_ratios(&all_tnotes()).unwrap();
    // Full survivor fraction keeps the profile flat across the passing.
    plan.set_spending_profile(ProfileShape::Flat, 100.0).unwrap();
    plan.set_beneficiary_fractions([1.0, 1.0, 1.0]).unwrap();

    let mut options = basic_options();
    options.bequest = Some(0.0);

    let solved = plan.solve(Objective::MaxSpending, &options).unwrap();
    let expected = annuity_due_payment(120_000.0, 0.04, 12);
    assert!(
        (solved.basis - expected).abs() / expected < 0.01,
        "basis {} != {expected}",
        solved.basis
    );
    // Everything transfers to the survivor: no partial bequest.
    assert!(solved.partial_bequest.abs() < 1e-6);
    // The deceased's accounts are empty after the transfer year.
    let n_d = 10;
    for j in 0..3 {
        assert!(solved.balances.at(1, j, n_d + 1).abs() < 0.02);
    }
}

/// Zero assets and zero income yield zero spending.
#[test]
fn empty_plan_spends_nothing() {
    let plan = single_plan(60, 8, [0.0, 0.0, 0.0], zero_rates(), &all_cash());
    let mut options = basic_options();
    options.bequest = Some(0.0);

    let solved = plan.solve(Objective::MaxSpending, &options).unwrap();
    assert!(solved.basis.abs() < 1e-9);
    assert!(solved.net_spending_n.iter().all(|&g| g.abs() < 1e-9));
    assert!(solved.bequest.abs() < 1e-9);
}

/// One-year horizon still solves and meets the objective.
#[test]
fn single_year_horizon() {
    let plan = single_plan(60, 1, [10_000.0, 0.0, 0.0], zero_rates(), &all_cash());
    let mut options = basic_options();
    options.bequest = Some(0.0);

    let solved = plan.solve(Objective::MaxSpending, &options).unwrap();
    assert!((solved.basis - 10_000.0).abs() < 0.05, "basis {}", solved.basis);
}

/// Wages flow through the contributions table into spendable cash.
#[test]
fn wages_fund_spending() {
    use crate::timelists::{ContributionRow, ContributionsTable};

    let mut plan = single_plan(60, 5, [0.0, 0.0, 0.0], zero_rates(), &all_cash());
    let rows: Vec<ContributionRow> = (0..5)
        .map(|n| ContributionRow {
            year: this_year() + n,
            wages: 10_000.0,
            ..Default::default()
        })
        .collect();
    plan.set_contributions(&[ContributionsTable::new("alex", rows)])
        .unwrap();

    let mut options = basic_options();
    options.bequest = Some(0.0);

    let solved = plan.solve(Objective::MaxSpending, &options).unwrap();
    assert!(
        (solved.basis - 10_000.0).abs() < 0.05,
        "basis {}",
        solved.basis
    );
    assert!(solved.ordinary_tax_n.iter().sum::<f64>() < 1e-6);
}

/// Medicare premium tiers as binary selectors: modest income stays in the
/// base tier, and the premium reduces spendable cash.
#[test]
fn medicare_optimize_base_tier() {
    // Income stays below the standard deduction in every year, so the
    // premium is the only difference between the two runs.
    let mut plan = single_plan(66, 6, [0.0, 90_000.0, 0.0], zero_rates(), &all_cash());
    plan.set_spending_profile(ProfileShape::Flat, 100.0).unwrap();

    let mut with_medicare = basic_options();
    with_medicare.bequest = Some(0.0);
    with_medicare.with_medicare = crate::plan::MedicareMode::Optimize;

    let solved = plan.solve(Objective::MaxSpending, &with_medicare).unwrap();
    let basic_premium = 12.0 * 202.90;
    for n in 0..6 {
        assert!(
            (solved.medicare_n[n] - basic_premium).abs() < 0.5,
            "year {n}: medicare {} != {basic_premium}",
            solved.medicare_n[n]
        );
    }

    let mut without = basic_options();
    without.bequest = Some(0.0);
    let plain = plan.solve(Objective::MaxSpending, &without).unwrap();
    assert!(solved.basis < plain.basis);
    assert!((plain.basis - solved.basis - basic_premium).abs() < 1.0);
}
