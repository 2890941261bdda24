//! Integration tests for plan construction and optimization.

mod income;
mod invariants;
mod scenarios;

use crate::allocation::AllocationSpec;
use crate::plan::{MedicareMode, Plan, SolveOptions, Units};
use crate::profile::ProfileShape;
use crate::rates::RateMethod;

pub(crate) fn this_year() -> i32 {
    i32::from(jiff::Zoned::now().date().year())
}

/// Birth date putting the individual at `age` this year (mid-January).
pub(crate) fn dob(age: i32) -> String {
    format!("{}-01-15", this_year() - age)
}

/// Expectancy yielding the given plan horizon for an individual of `age`.
pub(crate) fn expectancy_for(age: i32, horizon: i32) -> i32 {
    age + horizon - 1
}

/// 100% cash (inflation-indexed class), constant over the horizon.
pub(crate) fn all_cash() -> AllocationSpec {
    AllocationSpec::Coordinated {
        generic: [[0.0, 0.0, 0.0, 100.0], [0.0, 0.0, 0.0, 100.0]],
    }
}

/// 100% T-notes, constant over the horizon.
pub(crate) fn all_tnotes() -> AllocationSpec {
    AllocationSpec::Coordinated {
        generic: [[0.0, 0.0, 100.0, 0.0], [0.0, 0.0, 100.0, 0.0]],
    }
}

pub(crate) fn zero_rates() -> RateMethod {
    RateMethod::User {
        values: [0.0, 0.0, 0.0, 0.0],
    }
}

/// T-notes at 4%, everything else (including inflation) at zero.
pub(crate) fn tnotes_4pct() -> RateMethod {
    RateMethod::User {
        values: [0.0, 0.0, 4.0, 0.0],
    }
}

/// Options for deterministic scenario tests: dollar units, no Medicare,
/// no exclusion binaries.
pub(crate) fn basic_options() -> SolveOptions {
    SolveOptions {
        units: Units::One,
        with_medicare: MedicareMode::None,
        xor_constraints: false,
        ..SolveOptions::default()
    }
}

/// A single-individual plan with a flat profile and the given balances.
pub(crate) fn single_plan(
    age: i32,
    horizon: i32,
    balances: [f64; 3],
    rates: RateMethod,
    allocation: &AllocationSpec,
) -> Plan {
    let dob_s = dob(age);
    let mut plan = Plan::new(
        &["alex"],
        &[dob_s.as_str()],
        &[expectancy_for(age, horizon)],
        "test case",
    )
    .unwrap();
    plan.set_rates(rates).unwrap();
    plan.set_account_balances(
        &[balances[0]],
        &[balances[1]],
        &[balances[2]],
        Some("01-01"),
    )
    .unwrap();
    plan.set_allocation_ratios(allocation).unwrap();
    plan.set_spending_profile(ProfileShape::Flat, 60.0).unwrap();
    plan
}

/// Start-of-year withdrawal annuity payment exhausting `pv` over `n` years
/// at rate `r`.
pub(crate) fn annuity_due_payment(pv: f64, r: f64, n: i32) -> f64 {
    pv * r / ((1.0 - (1.0 + r).powi(-n)) * (1.0 + r))
}
