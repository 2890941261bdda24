//! Retirement-planning optimization library.
//!
//! This crate models a household's retirement as a Mixed-Integer Linear
//! Program whose optimum is either the maximum sustainable net-spending
//! basis for a required bequest, or the maximum after-tax bequest for a
//! required spending basis. It supports:
//! - Three account types (taxable, tax-deferred, tax-free) per individual
//! - Federal tax brackets under two regimes, RMDs, the Roth five-year rule
//! - Medicare/IRMAA premiums, NIIT, and the LTCG rate band, refined through
//!   a self-consistent outer loop
//! - Spousal transfers at the first passing and surplus-deposit splitting
//! - Rate models: fixed presets, historical windows, and correlated
//!   multivariate Gaussian draws
//! - Historical-range and Monte Carlo sweeps over the solved plan
//!
//! # Example
//!
//! ```ignore
//! use retiro_core::{Plan, Objective, SolveOptions, RateMethod, ProfileShape, AllocationSpec};
//!
//! let mut plan = Plan::new(&["Alex"], &["1964-03-15"], &[92], "base case")?;
//! plan.set_rates(RateMethod::Conservative)?;
//! plan.set_account_balances(&[120_000.0], &[600_000.0], &[150_000.0], Some("01-01"))?;
//! plan.set_spending_profile(ProfileShape::Flat, 60.0)?;
//! plan.set_allocation_ratios(&AllocationSpec::Coordinated {
//!     generic: [[60.0, 20.0, 10.0, 10.0], [40.0, 30.0, 20.0, 10.0]],
//! })?;
//! let solved = plan.solve(Objective::MaxSpending, &SolveOptions::default())?;
//! println!("basis: ${:.0}", solved.basis);
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod allocation;
mod builder;
pub mod debts;
pub mod error;
pub mod fixed_assets;
pub mod grid;
pub mod history;
pub mod layout;
pub mod lp;
pub mod plan;
pub mod profile;
pub mod rates;
pub mod results;
pub mod social_security;
pub mod solver;
pub mod sweep;
pub mod tax;
pub mod timelists;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use allocation::{AllocationSpec, GlidePair, InterpMethod};
pub use debts::{Debt, DebtKind};
pub use error::{PlanError, Result};
pub use fixed_assets::{FixedAsset, FixedAssetKind};
pub use plan::{
    CancelToken, MedicareMode, Objective, Plan, RothConversionCap, SolveControl, SolveOptions,
    Units,
};
pub use profile::ProfileShape;
pub use rates::{CorrelationSpec, RateMethod};
pub use results::{CaseStatus, SolvedPlan};
pub use solver::SolverBackend;
pub use sweep::{
    ScenarioOutcome, SweepProgress, SweepResult, run_historical_range, run_monte_carlo,
};
pub use timelists::{ContributionRow, ContributionsTable};
