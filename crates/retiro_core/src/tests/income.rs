//! Pension and Social Security stream construction.

use super::*;
use approx::assert_relative_eq;
use crate::plan::Plan;
use crate::profile::ProfileShape;

fn bare_single(age: i32, horizon: i32) -> Plan {
    let dob_s = dob(age);
    Plan::new(
        &["alex"],
        &[dob_s.as_str()],
        &[expectancy_for(age, horizon)],
        "income",
    )
    .unwrap()
}

#[test]
fn pension_starts_at_claim_age_with_proration() {
    let mut plan = bare_single(60, 15);
    // Born mid-January: claiming at 65 starts five years in, with almost a
    // full first year.
    plan.set_pension(&[1_000.0], &[65.0], None).unwrap();
    assert_eq!(plan.pi_in.at(0, 4), 0.0);
    assert!(plan.pi_in.at(0, 5) > 0.0);
    assert_relative_eq!(plan.pi_in.at(0, 6), 12_000.0, epsilon = 1e-9);
    // First-year amount never exceeds the full-year amount.
    assert!(plan.pi_in.at(0, 5) <= 12_000.0);
}

#[test]
fn social_security_arrears_and_factor() {
    let mut plan = bare_single(60, 15);
    plan.set_social_security(&[2_000.0], &[67.0]).unwrap();
    // FRA is 67 for these birth years: full PIA, paid in arrears starting
    // seven years in.
    assert_eq!(plan.zeta_in.at(0, 6), 0.0);
    let first = plan.zeta_in.at(0, 7);
    assert!(first > 0.0 && first < 24_000.0, "first-year {first}");
    assert_relative_eq!(plan.zeta_in.at(0, 8), 24_000.0, epsilon = 1e-6);
}

#[test]
fn social_security_early_claim_reduced() {
    let mut plan = bare_single(60, 15);
    plan.set_social_security(&[2_000.0], &[62.5]).unwrap();
    // Claiming 4.5 years early with FRA 67: below 75% of PIA.
    let steady = plan.zeta_in.at(0, 5);
    assert!(steady < 0.75 * 24_000.0, "steady {steady}");
    assert!(steady > 0.69 * 24_000.0, "steady {steady}");
}

#[test]
fn survivor_takes_larger_benefit() {
    let dob0 = dob(60);
    let dob1 = dob(62);
    let mut plan = Plan::new(
        &["ana", "ben"],
        &[dob0.as_str(), dob1.as_str()],
        &[expectancy_for(60, 20), expectancy_for(62, 10)],
        "survivors",
    )
    .unwrap();
    // The shorter-lived spouse has the much larger benefit.
    plan.set_social_security(&[500.0, 2_500.0], &[67.0, 67.0])
        .unwrap();
    let n_d = 10;
    let before = plan.zeta_in.at(0, n_d - 1);
    let after = plan.zeta_in.at(0, n_d);
    assert!(after > before, "survivor benefit did not step up");
    assert_relative_eq!(after, plan.zeta_in.at(1, n_d - 1), epsilon = 1e-6);
}

#[test]
fn spousal_top_up_applies() {
    let dob0 = dob(65);
    let dob1 = dob(65);
    let mut plan = Plan::new(
        &["ana", "ben"],
        &[dob0.as_str(), dob1.as_str()],
        &[expectancy_for(65, 20), expectancy_for(65, 20)],
        "spousal",
    )
    .unwrap();
    plan.set_social_security(&[400.0, 2_400.0], &[67.0, 67.0])
        .unwrap();
    // Spousal top-up: max(0, 0.5*2400 - 400) = 800 on top of own 400.
    let steady = plan.zeta_in.at(0, 4);
    assert_relative_eq!(steady, 12.0 * (400.0 + 800.0), epsilon = 1.0);
}

#[test]
fn indexed_pension_follows_inflation() {
    let dob_s = dob(60);
    let mut plan = Plan::new(
        &["alex"],
        &[dob_s.as_str()],
        &[expectancy_for(60, 10)],
        "indexed",
    )
    .unwrap();
    plan.set_rates(crate::rates::RateMethod::User {
        values: [0.0, 0.0, 0.0, 3.0],
    })
    .unwrap();
    plan.set_account_balances(&[10_000.0], &[0.0], &[0.0], Some("01-01"))
        .unwrap();
    plan.set_allocation_ratios(&all_cash()).unwrap();
    plan.set_spending_profile(ProfileShape::Flat, 60.0).unwrap();
    plan.set_pension(&[1_000.0], &[60.0], Some(&[true])).unwrap();

    // Indexed pensions are scaled by gamma inside the solve; the raw
    // stream stays nominal here.
    assert_relative_eq!(plan.pi_in.at(0, 5), 12_000.0, epsilon = 1e-6);
}
