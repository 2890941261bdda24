//! Structural invariants on solved plans.

use super::*;
use crate::plan::Objective;

fn tnotes_solved() -> (crate::plan::Plan, crate::results::SolvedPlan) {
    let plan = single_plan(60, 12, [0.0, 0.0, 120_000.0], tnotes_4pct(), &all_tnotes());
    let mut options = basic_options();
    options.bequest = Some(0.0);
    let solved = plan.solve(Objective::MaxSpending, &options).unwrap();
    (plan, solved)
}

#[test]
fn withdrawals_never_exceed_balances() {
    let (_, solved) = tnotes_solved();
    let (n_i, n_j, n_n) = solved.withdrawals.shape();
    for i in 0..n_i {
        for j in 0..n_j {
            for n in 0..n_n {
                // Cent rounding can move each side by half a cent.
                assert!(
                    solved.withdrawals.at(i, j, n) <= solved.balances.at(i, j, n) + 0.02,
                    "w > b at ({i},{j},{n})"
                );
            }
        }
    }
}

#[test]
fn balance_transition_matches_closed_form() {
    let (_, solved) = tnotes_solved();
    // Tax-free account, 100% T-notes at 4%: b_{n+1} = 1.04 (b_n - w_n).
    for n in 0..12 {
        let expected = 1.04 * (solved.balances.at(0, 2, n) - solved.withdrawals.at(0, 2, n));
        assert!(
            (solved.balances.at(0, 2, n + 1) - expected).abs() < 0.02,
            "transition off at year {n}: {} vs {expected}",
            solved.balances.at(0, 2, n + 1)
        );
    }
}

#[test]
fn flat_profile_keeps_spending_constant() {
    let (_, solved) = tnotes_solved();
    let g0 = solved.net_spending_n[0];
    for (n, &g) in solved.net_spending_n.iter().enumerate() {
        assert!((g - g0).abs() < 0.02, "g[{n}] = {g} != {g0}");
    }
}

#[test]
fn spending_slack_keeps_profile_in_corridor() {
    let plan = single_plan(60, 12, [0.0, 0.0, 120_000.0], tnotes_4pct(), &all_tnotes());
    let mut options = basic_options();
    options.bequest = Some(0.0);
    options.spending_slack = 20.0;

    let solved = plan.solve(Objective::MaxSpending, &options).unwrap();
    let lambda = 0.20;
    let g0 = solved.net_spending_n[0];
    // Flat profile, zero inflation: the corridor is direct on g.
    for (n, &g) in solved.net_spending_n.iter().enumerate().skip(1) {
        assert!(
            (1.0 - lambda) * g0 <= g + 0.05 && g <= (1.0 + lambda) * g0 + 0.05,
            "g[{n}] = {g} outside corridor around {g0}"
        );
    }
    // Slack widens the feasible set: total spending cannot get worse.
    let (_, tight) = tnotes_solved();
    let total: f64 = solved.net_spending_n.iter().sum();
    let tight_total: f64 = tight.net_spending_n.iter().sum();
    assert!(total >= tight_total - 0.01);
}

#[test]
fn rmd_floor_is_respected() {
    // Age 75, well into RMD territory.
    let plan = single_plan(75, 11, [0.0, 500_000.0, 0.0], zero_rates(), &all_cash());
    let mut options = basic_options();
    options.bequest = Some(0.0);

    let solved = plan.solve(Objective::MaxSpending, &options).unwrap();
    for n in 0..11 {
        let floor = solved.rmd_in.at(0, n);
        assert!(
            solved.withdrawals.at(0, 1, n) >= floor - 0.02,
            "RMD violated at year {n}: {} < {floor}",
            solved.withdrawals.at(0, 1, n)
        );
    }
}

#[test]
fn resolve_is_deterministic() {
    let (plan, first) = tnotes_solved();
    let mut options = basic_options();
    options.bequest = Some(0.0);
    let second = plan.solve(Objective::MaxSpending, &options).unwrap();
    assert!((first.basis - second.basis).abs() < 1e-9);
    assert_eq!(first.balances, second.balances);
    assert_eq!(first.withdrawals, second.withdrawals);
}

#[test]
fn clone_solves_identically() {
    let (plan, original) = tnotes_solved();
    let clone = plan.clone();
    let mut options = basic_options();
    options.bequest = Some(0.0);
    let cloned = clone.solve(Objective::MaxSpending, &options).unwrap();
    assert!((original.basis - cloned.basis).abs() < 1e-9);
    assert_eq!(original.balances, cloned.balances);
}

#[test]
fn surplus_forbidden_in_terminal_year() {
    let (_, solved) = tnotes_solved();
    assert_eq!(*solved.surplus_n.last().unwrap(), 0.0);
}

#[test]
fn magi_matches_income_components() {
    let (_, solved) = tnotes_solved();
    for n in 0..solved.magi_n.len() {
        let ordinary: f64 = (0..7).map(|t| solved.bracket_fill_tn.at(t, n)).sum();
        let expected = ordinary + solved.deduction_used_n[n] + solved.dividends_gains_n[n];
        assert!(
            (solved.magi_n[n] - expected).abs() < 1e-6,
            "MAGI mismatch at {n}"
        );
    }
}
