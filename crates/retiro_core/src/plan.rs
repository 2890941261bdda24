//! Plan inputs, derived schedules, and the self-consistent solve loop.
//!
//! A [`Plan`] collects demographics, balances, income streams, allocation
//! glide paths, and rate assumptions through validating setters, then
//! [`Plan::solve`] builds and solves the MILP, refining the MAGI-dependent
//! quantities (Medicare premiums, LTCG rate band, NIIT) until the solution
//! stabilizes. The plan itself is immutable through a solve; results come
//! back as a detached [`SolvedPlan`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use jiff::Zoned;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::allocation::{AllocationSpec, InterpMethod, N_J, build_allocations};
use crate::builder::build_model;
use crate::debts::{self, Debt};
use crate::error::{PlanError, Result};
use crate::fixed_assets::{self, FixedAsset};
use crate::grid::{Grid2, Grid3, Grid4};
use crate::layout::VarLayout;
use crate::profile::{ProfileShape, gen_xi};
use crate::rates::{N_K, RateMethod, RateModel, cumulative_inflation};
use crate::results::{CaseStatus, SolvedPlan};
use crate::social_security as socsec;
use crate::solver::SolverBackend;
use crate::tax::{self, MedicareSchedule, N_T};
use crate::timelists::ContributionsTable;

/// Optimization objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Objective {
    /// Maximize the inflation-adjusted net-spending basis subject to a
    /// required bequest.
    MaxSpending,
    /// Maximize the after-tax bequest subject to a required net-spending
    /// basis.
    MaxBequest,
}

/// Scaling applied to the numeric solve options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Units {
    One,
    #[default]
    K,
    M,
}

impl Units {
    #[must_use]
    pub fn factor(self) -> f64 {
        match self {
            Units::One => 1.0,
            Units::K => 1e3,
            Units::M => 1e6,
        }
    }
}

/// Medicare treatment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MedicareMode {
    /// No Medicare costs modeled.
    None,
    /// Premiums recomputed from MAGI inside the self-consistent loop.
    #[default]
    Loop,
    /// Premium tiers selected by binary variables inside the MILP.
    Optimize,
}

/// Cap on Roth conversions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RothConversionCap {
    /// Conversions bounded by this amount (in option units).
    Amount(f64),
    /// Conversions pinned to the schedule from the contributions table.
    FromTable,
}

/// Solve options. Numeric dollar options are scaled by `units`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct SolveOptions {
    pub max_roth_conversion: Option<RothConversionCap>,
    /// Disable conversions for the named individual.
    pub no_roth_conversions: Option<String>,
    /// Disable conversions before this calendar year.
    pub start_roth_conversions: Option<i32>,
    /// Required spending basis for `MaxBequest`.
    pub net_spending: Option<f64>,
    /// Required terminal estate for `MaxSpending`.
    pub bequest: Option<f64>,
    pub with_medicare: MedicareMode,
    /// MAGI of the two years preceding the plan, for early Medicare years.
    pub previous_magis: Option<[f64; 2]>,
    /// Enable the self-consistent outer loop.
    pub with_sc_loop: bool,
    /// Profile shape slack in percent, 0 to 50.
    pub spending_slack: f64,
    /// Emit the deposit-vs-withdrawal exclusion binaries.
    pub xor_constraints: bool,
    /// Big-M constant for the exclusion and tier-selection rows.
    pub big_m: f64,
    /// Opportunity-cost bias in percent shaving the fraction of a Roth
    /// conversion landing tax-free, discouraging marginal conversions.
    pub opp_cost_x: f64,
    pub solver: SolverBackend,
    pub units: Units,
    /// Wall-clock cap per solve; the last feasible iterate is reported
    /// as timed out.
    pub max_time_secs: Option<f64>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_roth_conversion: None,
            no_roth_conversions: None,
            start_roth_conversions: None,
            net_spending: None,
            bequest: None,
            with_medicare: MedicareMode::default(),
            previous_magis: None,
            with_sc_loop: true,
            spending_slack: 0.0,
            xor_constraints: true,
            big_m: 5e6,
            opp_cost_x: 0.0,
            solver: SolverBackend::default(),
            units: Units::default(),
            max_time_secs: None,
        }
    }
}

/// Cooperative cancellation flag, honored between self-consistent
/// iterations and between sweep scenarios.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// External control of a running solve.
#[derive(Debug, Clone, Default)]
pub struct SolveControl {
    pub cancel: CancelToken,
}

// Options after validation: units applied where noted, names resolved to
// indices, percentages converted to decimal.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedOptions {
    pub units: f64,
    pub bequest: Option<f64>,
    pub net_spending: Option<f64>,
    pub max_roth_conversion: Option<RothConversionCap>,
    pub no_roth_idx: Option<usize>,
    pub start_roth_year: Option<i32>,
    pub medicare: MedicareMode,
    pub sc_loop: bool,
    pub slack: f64,
    pub xor_constraints: bool,
    pub big_m: f64,
    pub xnet: f64,
    pub prev_magi: [f64; 2],
    pub backend: SolverBackend,
    pub max_time: Option<f64>,
}

// Quantities recomputed between solver invocations.
#[derive(Debug, Clone)]
pub(crate) struct ScQuantities {
    pub magi_n: Vec<f64>,
    pub psi_n: Vec<f64>,
    pub j_n: Vec<f64>,
    pub m_n: Vec<f64>,
}

impl ScQuantities {
    fn zeros(n_n: usize) -> Self {
        Self {
            magi_n: vec![0.0; n_n],
            psi_n: vec![0.0; n_n],
            j_n: vec![0.0; n_n],
            m_n: vec![0.0; n_n],
        }
    }
}

// Inflation-adjusted schedules that stay fixed through a solve.
#[derive(Debug, Clone)]
pub(crate) struct BaseSchedules {
    pub zeta_bar_in: Grid2,
    pub pi_bar_in: Grid2,
    pub xi_bar_n: Vec<f64>,
    pub medicare: MedicareSchedule,
}

// MAGI-dependent tax schedule, recomputed each iteration.
#[derive(Debug, Clone)]
pub(crate) struct TaxSched {
    pub sigma_bar_n: Vec<f64>,
    pub theta_tn: Grid2,
    pub delta_bar_tn: Grid2,
}

// Borrowed view of the configuration pieces that are optional until set.
pub(crate) struct ReadyView<'a> {
    pub tau_kn: &'a Grid2,
    pub gamma_n: &'a [f64],
    pub alpha_ijkn: &'a Grid4,
    pub beta_ij: &'a Grid2,
    pub xi_n: &'a [f64],
}

struct ShortAgg {
    magi_n: Vec<f64>,
    interest_n: Vec<f64>,
    gains_n: Vec<f64>,
}

/// Round a primal vector to cents, truncating toward zero and flushing
/// negative near-zeros.
pub(crate) fn round_cents(xs: &mut [f64]) {
    for v in xs.iter_mut() {
        let r = (*v * 100.0 + 0.5).trunc() / 100.0;
        *v = if r > -0.009 && r <= 0.0 { 0.0 } else { r };
    }
}

fn clock_seed() -> u64 {
    use std::sync::atomic::AtomicU64;
    use std::time::{SystemTime, UNIX_EPOCH};
    // Concurrent sweep workers can land on the same microsecond; a counter
    // keeps their seeds distinct.
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let uniq = COUNTER.fetch_add(1, Ordering::Relaxed);
    d.as_secs()
        .wrapping_mul(1_000_000)
        .wrapping_add(u64::from(d.subsec_micros()))
        .wrapping_add(uniq.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// The main planning object.
#[derive(Debug, Clone)]
pub struct Plan {
    pub(crate) name: String,
    description: String,
    pub(crate) inames: Vec<String>,
    pub(crate) yobs: Vec<i32>,
    pub(crate) mobs: Vec<i32>,
    pub(crate) tobs: Vec<i32>,
    pub(crate) expectancy: Vec<i32>,
    pub(crate) this_year: i32,
    pub(crate) n_i: usize,
    pub(crate) n_n: usize,
    pub(crate) horizons: Vec<usize>,
    pub(crate) year_n: Vec<i32>,
    pub(crate) n59: Vec<usize>,
    pub(crate) n_d: usize,
    pub(crate) i_d: usize,
    pub(crate) i_s: Option<usize>,

    // Policy parameters.
    pub(crate) chi: f64,
    pub(crate) mu: f64,
    pub(crate) nu: f64,
    pub(crate) eta: f64,
    pub(crate) phi_j: [f64; N_J],
    pub(crate) yobbba: i32,
    pub(crate) bonus_expiration_year: i32,

    // Income streams, annual dollars.
    pub(crate) pi_in: Grid2,
    pub(crate) zeta_in: Grid2,
    pension_indexed: Vec<bool>,

    // Contribution arrays; the last five columns hold the five years
    // preceding the plan for Roth-maturation accounting.
    pub(crate) omega_in: Grid2,
    pub(crate) big_ticket_in: Grid2,
    pub(crate) kappa_ijn: Grid3,
    pub(crate) roth_x_in: Grid2,

    // Household profile streams.
    pub(crate) debt_payments_n: Vec<f64>,
    pub(crate) residual_debt: f64,
    pub(crate) fa_tax_free_n: Vec<f64>,
    pub(crate) fa_ordinary_n: Vec<f64>,
    pub(crate) fa_gains_n: Vec<f64>,
    pub(crate) fa_bequest_value: f64,

    // Account balances and starting date.
    beta_ij: Option<Grid2>,
    start_date: Option<String>,
    pub(crate) year_frac_left: f64,

    // Rates.
    rate_method: Option<RateMethod>,
    reproducible: bool,
    rate_seed: Option<u64>,
    tau_kn: Option<Grid2>,
    gamma_n: Option<Vec<f64>>,

    // Allocation and spending profile.
    interp: InterpMethod,
    alpha_ijkn: Option<Grid4>,
    profile_shape: Option<ProfileShape>,
    xi_n: Option<Vec<f64>>,

    pub(crate) rho_in: Grid2,
}

impl Plan {
    /// Create a plan from names, ISO birth dates, and life expectancies.
    pub fn new(
        inames: &[&str],
        dobs: &[&str],
        expectancy: &[i32],
        name: &str,
    ) -> Result<Self> {
        if name.is_empty() {
            return Err(PlanError::config("plan must have a name"));
        }
        let n_i = dobs.len();
        if !(1..=2).contains(&n_i) {
            return Err(PlanError::config(format!("cannot support {n_i} individuals")));
        }
        if expectancy.len() != n_i || inames.len() != n_i {
            return Err(PlanError::config(format!(
                "names and expectancies must each have {n_i} entries"
            )));
        }
        if inames.iter().any(|s| s.is_empty()) {
            return Err(PlanError::config("name for each individual must be provided"));
        }

        let mut yobs = Vec::with_capacity(n_i);
        let mut mobs = Vec::with_capacity(n_i);
        let mut tobs = Vec::with_capacity(n_i);
        for dob in dobs {
            let date: Date = dob
                .parse()
                .map_err(|e| PlanError::config(format!("bad birth date '{dob}': {e}")))?;
            yobs.push(i32::from(date.year()));
            mobs.push(i32::from(date.month()));
            tobs.push(i32::from(date.day()));
        }

        let this_year = i32::from(Zoned::now().date().year());
        let mut horizons = Vec::with_capacity(n_i);
        for i in 0..n_i {
            let h = yobs[i] + expectancy[i] - this_year + 1;
            if h < 1 {
                return Err(PlanError::config(format!(
                    "life expectancy of {} is already in the past",
                    inames[i]
                )));
            }
            horizons.push(h as usize);
        }
        let n_n = *horizons.iter().max().unwrap_or(&1);
        let year_n: Vec<i32> = (0..n_n).map(|n| this_year + n as i32).collect();
        let n59: Vec<usize> = yobs
            .iter()
            .map(|&yob| (59 - this_year + yob).max(0) as usize)
            .collect();

        let (n_d, i_d, i_s) = if n_i == 2 && horizons[0] != horizons[1] {
            let n_d = *horizons.iter().min().unwrap_or(&n_n);
            let i_d = usize::from(horizons[1] == n_d);
            (n_d, i_d, Some(1 - i_d))
        } else {
            (n_n, 0, None)
        };

        let rho_in = tax::rmd_fractions(&yobs, expectancy, n_n, this_year)?;

        let s = if n_i == 2 { "s" } else { "" };
        log::info!("preparing a {n_n}-year scenario for {n_i} individual{s}");

        Ok(Self {
            name: name.to_string(),
            description: String::new(),
            inames: inames.iter().map(ToString::to_string).collect(),
            yobs,
            mobs,
            tobs,
            expectancy: expectancy.to_vec(),
            this_year,
            n_i,
            n_n,
            horizons,
            year_n,
            n59,
            n_d,
            i_d,
            i_s,
            chi: 0.6,
            mu: 0.018,
            nu: 0.30,
            eta: (n_i - 1) as f64 / 2.0,
            phi_j: [1.0, 1.0, 1.0],
            yobbba: 2032,
            bonus_expiration_year: 2028,
            pi_in: Grid2::zeros(n_i, n_n),
            zeta_in: Grid2::zeros(n_i, n_n),
            pension_indexed: vec![false; n_i],
            omega_in: Grid2::zeros(n_i, n_n),
            big_ticket_in: Grid2::zeros(n_i, n_n),
            kappa_ijn: Grid3::zeros(n_i, N_J, n_n + 5),
            roth_x_in: Grid2::zeros(n_i, n_n + 5),
            debt_payments_n: vec![0.0; n_n],
            residual_debt: 0.0,
            fa_tax_free_n: vec![0.0; n_n],
            fa_ordinary_n: vec![0.0; n_n],
            fa_gains_n: vec![0.0; n_n],
            fa_bequest_value: 0.0,
            beta_ij: None,
            start_date: None,
            year_frac_left: 1.0,
            rate_method: None,
            reproducible: false,
            rate_seed: None,
            tau_kn: None,
            gamma_n: None,
            interp: InterpMethod::default(),
            alpha_ijkn: None,
            profile_shape: None,
            xi_n: None,
            rho_in,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, new_name: impl Into<String>) {
        self.name = new_name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn horizon(&self) -> usize {
        self.n_n
    }

    #[must_use]
    pub fn years(&self) -> &[i32] {
        &self.year_n
    }

    #[must_use]
    pub fn individuals(&self) -> &[String] {
        &self.inames
    }

    #[must_use]
    pub fn life_expectancies(&self) -> &[i32] {
        &self.expectancy
    }

    #[must_use]
    pub fn start_date(&self) -> Option<&str> {
        self.start_date.as_deref()
    }

    /// Fraction of spending kept by the surviving spouse.
    #[must_use]
    pub fn survivor_fraction(&self) -> f64 {
        self.chi
    }

    #[must_use]
    pub fn spending_profile(&self) -> Option<ProfileShape> {
        self.profile_shape
    }

    /// Fraction of surplus deposited to the second spouse's taxable account.
    pub fn set_spousal_deposit_fraction(&mut self, eta: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&eta) {
            return Err(PlanError::config("fraction must be between 0 and 1"));
        }
        if self.n_i != 2 {
            log::info!("deposit fraction can only be 0 for single individuals");
            self.eta = 0.0;
        } else {
            self.eta = eta;
        }
        Ok(())
    }

    /// Dividend rate on equities in percent. Default 1.8%.
    pub fn set_dividend_rate(&mut self, mu_pct: f64) -> Result<()> {
        if !(0.0..=5.0).contains(&mu_pct) {
            return Err(PlanError::config("dividend rate must be between 0 and 5"));
        }
        self.mu = mu_pct / 100.0;
        Ok(())
    }

    /// Heirs tax rate on the tax-deferred estate in percent. Default 30%.
    pub fn set_heirs_tax_rate(&mut self, nu_pct: f64) -> Result<()> {
        if !(0.0..=100.0).contains(&nu_pct) {
            return Err(PlanError::config("rate must be between 0 and 100"));
        }
        self.nu = nu_pct / 100.0;
        Ok(())
    }

    /// Year at which the current bracket regime is assumed to expire.
    pub fn set_bracket_expiration_year(&mut self, year: i32) {
        self.yobbba = year;
    }

    /// Year after which the 65+ bonus deduction no longer applies.
    pub fn set_bonus_expiration_year(&mut self, year: i32) {
        self.bonus_expiration_year = year;
    }

    /// Fractions of each account type left to the surviving spouse.
    pub fn set_beneficiary_fractions(&mut self, phi: [f64; N_J]) -> Result<()> {
        if phi.iter().any(|&p| !(0.0..=1.0).contains(&p)) {
            return Err(PlanError::config("fractions must be between 0 and 1"));
        }
        self.phi_j = phi;
        if phi.iter().any(|&p| p != 1.0) {
            log::info!(
                "consider adjusting the spousal deposit fraction for better convergence"
            );
        }
        Ok(())
    }

    /// Monthly pension amounts and commencement ages. First-year amounts
    /// are prorated by birth month; indexed pensions follow inflation.
    pub fn set_pension(
        &mut self,
        amounts: &[f64],
        ages: &[f64],
        indexed: Option<&[bool]>,
    ) -> Result<()> {
        if amounts.len() != self.n_i || ages.len() != self.n_i {
            return Err(PlanError::config(format!(
                "pension amounts and ages must have {} entries",
                self.n_i
            )));
        }
        self.pi_in = Grid2::zeros(self.n_i, self.n_n);
        for i in 0..self.n_i {
            if amounts[i] == 0.0 {
                continue;
            }
            let real_age = ages[i] + (self.mobs[i] - 1) as f64 / 12.0;
            let iage = real_age.floor() as i32;
            let fraction = 1.0 - real_age.fract();
            let real_ns = iage - self.this_year + self.yobs[i];
            let ns = real_ns.max(0) as usize;
            let nd = self.horizons[i];
            for n in ns..nd {
                self.pi_in.set(i, n, amounts[i]);
            }
            if real_ns >= 0 && ns < nd {
                let v = self.pi_in.at(i, ns) * fraction;
                self.pi_in.set(i, ns, v);
            }
        }
        self.pi_in.scale(12.0);
        self.pension_indexed = match indexed {
            Some(flags) => {
                if flags.len() != self.n_i {
                    return Err(PlanError::config(format!(
                        "indexed flags must have {} entries",
                        self.n_i
                    )));
                }
                flags.to_vec()
            }
            None => vec![false; self.n_i],
        };
        Ok(())
    }

    /// Monthly Social Security PIAs and claiming ages.
    ///
    /// Benefits are paid in arrears (one-month lag) and the starting year
    /// is prorated accordingly. Spousal top-ups start when the later spouse
    /// claims; the survivor switches to the larger benefit.
    pub fn set_social_security(&mut self, pias: &[f64], ages: &[f64]) -> Result<()> {
        if pias.len() != self.n_i || ages.len() != self.n_i {
            return Err(PlanError::config(format!(
                "PIAs and ages must have {} entries",
                self.n_i
            )));
        }
        let mut ages = ages.to_vec();
        let fras: Vec<f64> = self
            .yobs
            .iter()
            .map(|&yob| socsec::full_retirement_age(yob))
            .collect();
        let spousal = socsec::spousal_benefits(pias)?;

        self.zeta_in = Grid2::zeros(self.n_i, self.n_n);
        for i in 0..self.n_i {
            let born_first = self.tobs[i] <= 2;
            let eligible = if born_first { 62.0 } else { 62.0 + 1.0 / 12.0 };
            if ages[i] < eligible {
                log::info!(
                    "resetting starting age of {} to {eligible:.4}",
                    self.inames[i]
                );
                ages[i] = eligible;
            }

            // Age relative to Jan 1 of the birth year when eligibility
            // starts; checks arrive one month later.
            let janage = ages[i] + (self.mobs[i] - 1) as f64 / 12.0;
            let payment_janage = janage + 1.0 / 12.0;
            let payment_iage = payment_janage.floor() as i32;
            let payment_real_ns = self.yobs[i] + payment_iage - self.this_year;
            let ns = payment_real_ns.max(0) as usize;
            let nd = self.horizons[i];
            for n in ns..nd {
                self.zeta_in.set(i, n, pias[i]);
            }
            if payment_real_ns >= 0 && ns < nd {
                let v = self.zeta_in.at(i, ns) * (1.0 - payment_janage.fract());
                self.zeta_in.set(i, ns, v);
            }

            let factor = socsec::self_factor(fras[i], ages[i], born_first)?;
            for n in 0..nd {
                let v = self.zeta_in.at(i, n) * factor;
                self.zeta_in.set(i, n, v);
            }

            if self.n_i == 2 && spousal[i] > 0.0 {
                // The later of the two claims triggers the spousal top-up.
                let claim_year = (0..2)
                    .map(|j| self.yobs[j] as f64 + (self.mobs[j] - 1) as f64 / 12.0 + ages[j])
                    .fold(f64::NEG_INFINITY, f64::max);
                let claim_age = claim_year - self.yobs[i] as f64 - (self.mobs[i] - 1) as f64 / 12.0;
                let payment_claim_year = claim_year + 1.0 / 12.0;
                let ns2 = ((payment_claim_year.floor() as i32) - self.this_year).max(0) as usize;
                let sf = socsec::spousal_factor(fras[i], claim_age, born_first)?;
                for n in ns2.min(nd)..nd {
                    self.zeta_in.add(i, n, spousal[i] * sf);
                }
                if ns2 < nd {
                    self.zeta_in
                        .add(i, ns2, -spousal[i] * sf * payment_claim_year.fract());
                }
            }
        }

        // Survivor takes over the larger benefit, already in arrears.
        if let Some(i_s) = self.i_s {
            if self.n_d >= 1
                && self.n_d < self.n_n
                && self.zeta_in.at(self.i_d, self.n_d - 1) > self.zeta_in.at(i_s, self.n_d - 1)
            {
                let survivor_benefit = self.zeta_in.at(self.i_d, self.n_d - 1);
                for n in self.n_d..self.horizons[i_s] {
                    self.zeta_in.set(i_s, n, survivor_benefit);
                }
            }
        }

        self.zeta_in.scale(12.0);
        Ok(())
    }

    /// Spending profile shape and the surviving-spouse percentage.
    pub fn set_spending_profile(&mut self, shape: ProfileShape, survivor_pct: f64) -> Result<()> {
        if !(0.0..=100.0).contains(&survivor_pct) {
            return Err(PlanError::config(format!(
                "survivor value {survivor_pct} outside range"
            )));
        }
        self.chi = survivor_pct / 100.0;
        self.xi_n = Some(gen_xi(shape, self.chi, self.n_d, self.n_n)?);
        self.profile_shape = Some(shape);
        Ok(())
    }

    /// Whether stochastic rates should be reproducible across re-solves.
    pub fn set_reproducible(&mut self, reproducible: bool, seed: Option<u64>) {
        self.reproducible = reproducible;
        if reproducible {
            self.rate_seed = Some(seed.or(self.rate_seed).unwrap_or_else(clock_seed));
        } else {
            self.rate_seed = None;
        }
    }

    /// Select the rate method and generate the series and inflation
    /// multipliers for the plan horizon.
    pub fn set_rates(&mut self, method: RateMethod) -> Result<()> {
        self.set_rates_impl(method, false)
    }

    fn with_default_to(&self, method: RateMethod) -> RateMethod {
        let fill = |frm: i32, to: Option<i32>| {
            Some(to.unwrap_or_else(|| (frm + self.n_n as i32 - 1).min(crate::history::TO)))
        };
        match method {
            RateMethod::Historical { frm, to } => RateMethod::Historical {
                frm,
                to: fill(frm, to),
            },
            RateMethod::HistoricalAverage { frm, to } => RateMethod::HistoricalAverage {
                frm,
                to: fill(frm, to),
            },
            RateMethod::Histochastic { frm, to } => RateMethod::Histochastic {
                frm,
                to: fill(frm, to),
            },
            other => other,
        }
    }

    fn set_rates_impl(&mut self, method: RateMethod, override_reproducible: bool) -> Result<()> {
        let method = self.with_default_to(method);
        let seed = if method.is_stochastic() {
            if self.reproducible && !override_reproducible {
                Some(self.rate_seed.ok_or_else(|| {
                    PlanError::config("reproducible rates requested but no seed is set")
                })?)
            } else {
                let seed = clock_seed();
                if !override_reproducible {
                    self.rate_seed = Some(seed);
                }
                Some(seed)
            }
        } else {
            None
        };

        let mut model = RateModel::new(method.clone(), seed)?;
        let tau = model.gen_series(self.n_n)?;
        self.gamma_n = Some(cumulative_inflation(&tau));
        self.tau_kn = Some(tau);
        self.rate_method = Some(method);
        Ok(())
    }

    /// Regenerate stochastic rate series. Deterministic methods are
    /// unchanged; reproducible rates are kept unless overridden.
    pub fn regen_rates(&mut self, override_reproducible: bool) -> Result<()> {
        let Some(method) = self.rate_method.clone() else {
            return Ok(());
        };
        if !method.is_stochastic() {
            return Ok(());
        }
        if self.reproducible && !override_reproducible {
            return Ok(());
        }
        self.set_rates_impl(method, override_reproducible)
    }

    #[must_use]
    pub fn rate_method(&self) -> Option<&RateMethod> {
        self.rate_method.as_ref()
    }

    /// Current account balances in dollars and the plan starting date
    /// (`"MM-DD"` or `"YYYY-MM-DD"`; the year is ignored).
    pub fn set_account_balances(
        &mut self,
        taxable: &[f64],
        tax_deferred: &[f64],
        tax_free: &[f64],
        start_date: Option<&str>,
    ) -> Result<()> {
        for (what, vals) in [
            ("taxable", taxable),
            ("taxDeferred", tax_deferred),
            ("taxFree", tax_free),
        ] {
            if vals.len() != self.n_i {
                return Err(PlanError::config(format!(
                    "{what} must have {} entries",
                    self.n_i
                )));
            }
            if vals.iter().any(|&v| v < 0.0) {
                return Err(PlanError::config(format!("{what} balances must be >= 0")));
            }
        }
        let mut beta = Grid2::zeros(self.n_i, N_J);
        for i in 0..self.n_i {
            beta.set(i, 0, taxable[i]);
            beta.set(i, 1, tax_deferred[i]);
            beta.set(i, 2, tax_free[i]);
        }
        self.beta_ij = Some(beta);
        self.set_starting_date(start_date)?;
        Ok(())
    }

    fn set_starting_date(&mut self, date_str: Option<&str>) -> Result<()> {
        let today = Zoned::now().date();
        let (month, day, label) = match date_str {
            None => (
                i32::from(today.month()),
                i32::from(today.day()),
                today.to_string(),
            ),
            Some(s) => {
                let normalized = s.replace('/', "-");
                let parts: Vec<&str> = normalized.split('-').collect();
                if !(parts.len() == 2 || parts.len() == 3) {
                    return Err(PlanError::config(
                        "date must be \"MM-DD\" or \"YYYY-MM-DD\"",
                    ));
                }
                let month: i32 = parts[parts.len() - 2]
                    .parse()
                    .map_err(|_| PlanError::config(format!("bad starting date '{s}'")))?;
                let day: i32 = parts[parts.len() - 1]
                    .parse()
                    .map_err(|_| PlanError::config(format!("bad starting date '{s}'")))?;
                (month, day, s.to_string())
            }
        };

        let refdate = Date::new(self.this_year as i16, month as i8, day as i8)
            .map_err(|e| PlanError::config(format!("bad starting date: {e}")))?;
        let days_in_year = i32::from(
            Date::new(self.this_year as i16, 12, 31)
                .map_err(|e| PlanError::config(format!("calendar error: {e}")))?
                .day_of_year(),
        );
        let doy = i32::from(refdate.day_of_year());
        self.year_frac_left = 1.0 - (doy - 1) as f64 / days_in_year as f64;
        self.start_date = Some(label);
        Ok(())
    }

    /// Interpolation method for allocation glide paths. Takes effect on the
    /// next [`Plan::set_allocation_ratios`] call.
    pub fn set_interpolation(&mut self, method: InterpMethod) {
        self.interp = method;
    }

    /// Allocation glide paths, as initial/final percent vectors.
    pub fn set_allocation_ratios(&mut self, spec: &AllocationSpec) -> Result<()> {
        self.alpha_ijkn = Some(build_allocations(spec, self.interp, &self.horizons, self.n_n)?);
        Ok(())
    }

    /// Install conditioned wages-and-contributions tables, one per
    /// individual, matched by name.
    pub fn set_contributions(&mut self, tables: &[ContributionsTable]) -> Result<()> {
        self.zero_contributions();
        for (i, iname) in self.inames.clone().iter().enumerate() {
            let table = tables
                .iter()
                .find(|t| &t.name == iname)
                .ok_or_else(|| PlanError::config(format!("no table found for {iname}")))?;
            let h = self.horizons[i];
            let rows = table.conditioned(h, self.this_year)?;

            // Plan years occupy rows 5.., the five prior years rows 0..5.
            for n in 0..h {
                let row = &rows[5 + n];
                self.omega_in.set(i, n, row.wages + row.other_income);
                self.big_ticket_in.set(i, n, row.big_ticket_items);
                self.kappa_ijn.set(i, 0, n, row.taxable_ctrb);
                self.kappa_ijn.set(i, 1, n, row.ctrb_401k + row.ctrb_ira);
                self.kappa_ijn
                    .set(i, 2, n, row.ctrb_roth_401k + row.ctrb_roth_ira);
                self.roth_x_in.set(i, n, row.roth_conversion);
            }
            // Prior years land at the tail for negative-offset access.
            for t in 0..5 {
                let row = &rows[t];
                self.kappa_ijn.set(i, 0, self.n_n + t, row.taxable_ctrb);
                self.kappa_ijn
                    .set(i, 1, self.n_n + t, row.ctrb_401k + row.ctrb_ira);
                self.kappa_ijn
                    .set(i, 2, self.n_n + t, row.ctrb_roth_401k + row.ctrb_roth_ira);
                self.roth_x_in.set(i, self.n_n + t, row.roth_conversion);
            }
        }
        Ok(())
    }

    /// Reset wages and contributions to zero.
    pub fn zero_contributions(&mut self) {
        self.omega_in = Grid2::zeros(self.n_i, self.n_n);
        self.big_ticket_in = Grid2::zeros(self.n_i, self.n_n);
        self.kappa_ijn = Grid3::zeros(self.n_i, N_J, self.n_n + 5);
        self.roth_x_in = Grid2::zeros(self.n_i, self.n_n + 5);
    }

    /// Process household debts and fixed assets into yearly streams and
    /// end-of-plan adjustments.
    pub fn set_household(&mut self, household_debts: &[Debt], assets: &[FixedAsset]) {
        self.debt_payments_n = debts::payments_array(household_debts, self.n_n, self.this_year);
        self.residual_debt = debts::residual_balance(household_debts, self.n_n, self.this_year);
        let streams = fixed_assets::disposition_streams(
            assets,
            self.n_n,
            self.this_year,
            self.n_i == 2,
        );
        self.fa_tax_free_n = streams.tax_free_n;
        self.fa_ordinary_n = streams.ordinary_income_n;
        self.fa_gains_n = streams.capital_gains_n;
        self.fa_bequest_value = fixed_assets::bequest_value(assets, self.n_n, self.this_year);
    }

    /// Fixed-asset bequest value in today's dollars, when rates are set.
    #[must_use]
    pub fn fixed_assets_bequest_today(&self) -> f64 {
        if self.fa_bequest_value == 0.0 {
            return 0.0;
        }
        match &self.gamma_n {
            Some(gamma) => self.fa_bequest_value / gamma[self.n_n],
            None => 0.0,
        }
    }

    pub(crate) fn ready(&self) -> Result<ReadyView<'_>> {
        let tau_kn = self
            .tau_kn
            .as_ref()
            .ok_or_else(|| PlanError::NotReady("a rate method must be selected".into()))?;
        let gamma_n = self
            .gamma_n
            .as_ref()
            .ok_or_else(|| PlanError::NotReady("inflation multipliers missing".into()))?;
        let alpha_ijkn = self
            .alpha_ijkn
            .as_ref()
            .ok_or_else(|| PlanError::NotReady("an allocation profile must be defined".into()))?;
        let beta_ij = self
            .beta_ij
            .as_ref()
            .ok_or_else(|| PlanError::NotReady("account balances must be set".into()))?;
        let xi_n = self
            .xi_n
            .as_ref()
            .ok_or_else(|| PlanError::NotReady("a spending profile must be defined".into()))?;
        Ok(ReadyView {
            tau_kn,
            gamma_n,
            alpha_ijkn,
            beta_ij,
            xi_n,
        })
    }

    fn base_schedules(&self, ready: &ReadyView) -> BaseSchedules {
        let n_n = self.n_n;
        let gamma = ready.gamma_n;

        let mut zeta_bar_in = self.zeta_in.clone();
        for i in 0..self.n_i {
            for n in 0..n_n {
                let v = zeta_bar_in.at(i, n) * gamma[n];
                zeta_bar_in.set(i, n, v);
            }
        }
        let mut pi_bar_in = self.pi_in.clone();
        for i in 0..self.n_i {
            if self.pension_indexed[i] {
                for n in 0..n_n {
                    let v = pi_bar_in.at(i, n) * gamma[n];
                    pi_bar_in.set(i, n, v);
                }
            }
        }
        let xi_bar_n: Vec<f64> = ready.xi_n.iter().enumerate().map(|(n, x)| x * gamma[n]).collect();
        let medicare = tax::medicare_values(&self.yobs, &self.horizons, gamma, n_n, self.this_year);

        BaseSchedules {
            zeta_bar_in,
            pi_bar_in,
            xi_bar_n,
            medicare,
        }
    }

    fn tax_sched(&self, ready: &ReadyView, magi_n: &[f64]) -> TaxSched {
        let params = tax::tax_params(
            &self.yobs,
            self.i_d,
            self.n_d,
            self.n_n,
            ready.gamma_n,
            magi_n,
            self.yobbba,
            self.bonus_expiration_year,
            self.this_year,
        );
        let mut delta_bar_tn = params.delta_tn.clone();
        for t in 0..N_T {
            for n in 0..self.n_n {
                let v = delta_bar_tn.at(t, n) * ready.gamma_n[n];
                delta_bar_tn.set(t, n, v);
            }
        }
        TaxSched {
            sigma_bar_n: params.sigma_bar_n,
            theta_tn: params.theta_tn,
            delta_bar_tn,
        }
    }

    fn resolve_options(&self, objective: Objective, options: &SolveOptions) -> Result<ResolvedOptions> {
        let units = options.units.factor();

        let mut bequest = options.bequest;
        let mut net_spending = options.net_spending;
        match objective {
            Objective::MaxBequest => {
                if net_spending.is_none() {
                    return Err(PlanError::config(
                        "objective maxBequest needs a netSpending option",
                    ));
                }
                if bequest.is_some() {
                    log::info!("ignoring bequest option provided");
                    bequest = None;
                }
            }
            Objective::MaxSpending => {
                if net_spending.is_some() {
                    log::info!("ignoring netSpending option provided");
                    net_spending = None;
                }
                if bequest.is_none() {
                    log::info!("using bequest of $1");
                }
            }
        }

        if !(0.0..=50.0).contains(&options.spending_slack) {
            return Err(PlanError::config(format!(
                "slack value out of range {}",
                options.spending_slack
            )));
        }

        let no_roth_idx = match &options.no_roth_conversions {
            None => None,
            Some(name) if name == "None" => None,
            Some(name) => Some(
                self.inames
                    .iter()
                    .position(|n| n == name)
                    .ok_or_else(|| {
                        PlanError::config(format!("unknown individual {name} for noRothConversions"))
                    })?,
            ),
        };

        let prev_magi = match options.previous_magis {
            Some(magis) => [magis[0] * units, magis[1] * units],
            None => [0.0, 0.0],
        };

        if options.big_m <= 0.0 {
            return Err(PlanError::config("bigM must be positive"));
        }

        Ok(ResolvedOptions {
            units,
            bequest,
            net_spending,
            max_roth_conversion: options.max_roth_conversion,
            no_roth_idx,
            start_roth_year: options.start_roth_conversions,
            medicare: options.with_medicare,
            sc_loop: options.with_sc_loop,
            slack: options.spending_slack / 100.0,
            xor_constraints: options.xor_constraints,
            big_m: options.big_m,
            xnet: 1.0 - options.opp_cost_x / 100.0,
            prev_magi,
            backend: options.solver,
            max_time: options.max_time_secs,
        })
    }

    /// Build and solve the plan for the given objective and options.
    pub fn solve(&self, objective: Objective, options: &SolveOptions) -> Result<SolvedPlan> {
        self.solve_with_control(objective, options, &SolveControl::default())
    }

    /// Like [`Plan::solve`], with a cooperative cancellation token honored
    /// between self-consistent iterations.
    pub fn solve_with_control(
        &self,
        objective: Objective,
        options: &SolveOptions,
        control: &SolveControl,
    ) -> Result<SolvedPlan> {
        let ready = self.ready()?;
        let opts = self.resolve_options(objective, options)?;
        let base = self.base_schedules(&ready);
        let layout = VarLayout::new(
            self.n_i,
            self.n_n,
            base.medicare.start,
            opts.medicare == MedicareMode::Optimize,
        );
        log::info!(
            "problem has {} decision variables (including {} binary)",
            layout.nvars,
            layout.nbins
        );

        let solver = opts.backend.instance();
        let obj_fac = match objective {
            Objective::MaxSpending => -1.0 / ready.xi_n[0],
            Objective::MaxBequest => -1.0 / ready.gamma_n[self.n_n],
        };

        let mut sc = ScQuantities::zeros(self.n_n);
        let start = Instant::now();
        let mut it = 0usize;
        let mut old_x = vec![0.0; layout.nvars];
        let mut old_objfns = vec![f64::INFINITY];
        let mut status = CaseStatus::Solved;
        let mut ncons = 0usize;

        let (objfn, xx, message) = loop {
            let tax_sched = self.tax_sched(&ready, &sc.magi_n);
            let model = build_model(self, &ready, &base, &tax_sched, &sc, &layout, objective, &opts)?;
            ncons = model.matrix.ncons();
            let sol = solver.solve(&model);
            if !sol.optimal {
                log::warn!("optimization failed: {}", sol.message);
                return Err(PlanError::Unsuccessful(sol.message));
            }

            if !opts.sc_loop {
                break (sol.objective, sol.x, sol.message);
            }

            let short = self.aggregate_short(&sol.x, &layout, &ready);
            sc.j_n = tax::niit(
                self.n_i,
                &short.magi_n,
                &short.interest_n,
                &short.gains_n,
                self.n_d,
                self.n_n,
            );
            sc.psi_n = tax::ltcg_rate(self.n_i, &short.magi_n, ready.gamma_n, self.n_d, self.n_n);
            if opts.medicare == MedicareMode::Loop {
                sc.m_n = tax::medicare_costs(
                    &self.yobs,
                    &self.horizons,
                    &short.magi_n,
                    &opts.prev_magi,
                    ready.gamma_n,
                    self.n_n,
                    self.this_year,
                );
            }
            sc.magi_n = short.magi_n;

            let abs_sol_diff: f64 = sol
                .x
                .iter()
                .zip(&old_x)
                .map(|(a, b)| (a - b).abs())
                .sum::<f64>()
                / 100.0;
            let last = *old_objfns.last().unwrap_or(&f64::INFINITY);
            let abs_obj_diff = (obj_fac * (sol.objective + last)).abs() / 100.0;
            log::debug!(
                "iteration {it}: objective ${:.2}, |dX| {abs_sol_diff:.2}, |df| ${abs_obj_diff:.2}",
                sol.objective * obj_fac
            );

            // Half-dollar accuracy on both the solution and the objective.
            if abs_sol_diff < 0.5 && abs_obj_diff < 0.5 {
                log::debug!("converged on full solution");
                break (sol.objective, sol.x, sol.message);
            }

            // Escape oscillatory solutions: accept when close to the best
            // of the most recent objectives.
            let recent_min = old_objfns[it / 2..]
                .iter()
                .fold(f64::INFINITY, |m, &v| m.min(v));
            if (-sol.objective - recent_min).abs() < 10.0 * ready.xi_n[0] {
                log::debug!("converged through selecting minimum oscillating objective");
                break (sol.objective, sol.x, sol.message);
            }

            if control.cancel.is_cancelled() {
                return Err(PlanError::Cancelled);
            }
            if let Some(max_time) = opts.max_time {
                if start.elapsed().as_secs_f64() > max_time {
                    log::warn!("time limit reached, reporting best-effort iterate");
                    status = CaseStatus::TimedOut;
                    break (sol.objective, sol.x, sol.message);
                }
            }
            if it > 59 {
                log::warn!("exiting self-consistent loop on maximum iterations");
                status = CaseStatus::Partial;
                break (sol.objective, sol.x, sol.message);
            }

            it += 1;
            old_objfns.push(-sol.objective);
            old_x = sol.x;
        };

        log::info!(
            "self-consistent loop returned after {} iteration(s), objective ${:.2}",
            it + 1,
            objfn * obj_fac
        );

        let tax_sched = self.tax_sched(&ready, &sc.magi_n);
        let mut solved = self.materialize(
            &xx, &ready, &tax_sched, &sc, &layout, objective, status, it + 1, message, objfn,
        );
        solved.ncons = ncons;
        Ok(solved)
    }

    fn decode(
        x: &[f64],
        offset: usize,
        len: usize,
    ) -> Vec<f64> {
        x[offset..offset + len].to_vec()
    }

    // Minimum decoding required to refresh the MAGI-dependent quantities.
    fn aggregate_short(&self, x: &[f64], l: &VarLayout, ready: &ReadyView) -> ShortAgg {
        let mut x = x.to_vec();
        round_cents(&mut x);
        let n_n = self.n_n;
        let alpha = ready.alpha_ijkn;
        let tau = ready.tau_kn;

        let e_n = Self::decode(&x, l.c_e, n_n);
        let mut g_ord = vec![0.0; n_n];
        for t in 0..N_T {
            for n in 0..n_n {
                g_ord[n] += x[l.ix_f(t, n)];
            }
        }

        let mut gains_n = self.fa_gains_n.clone();
        let mut interest_n = vec![0.0; n_n];
        for n in 0..n_n {
            let tau_prev = if n == 0 { 0.0 } else { tau.at(0, n - 1).max(0.0) };
            for i in 0..self.n_i {
                let b0 = x[l.ix_b(i, 0, n)];
                let w0 = x[l.ix_w(i, 0, n)];
                let d = x[l.ix_d(i, n)];
                gains_n[n] += (self.mu
                    * (b0 - w0 + d + 0.5 * self.kappa_ijn.at(i, 0, n))
                    + tau_prev * w0)
                    * alpha.at(i, 0, 0, n);
                let fak: f64 = (1..N_K)
                    .map(|k| alpha.at(i, 0, k, n) * tau.at(k, n))
                    .sum();
                interest_n[n] += (b0 + d - w0) * fak;
            }
        }

        let magi_n: Vec<f64> = (0..n_n).map(|n| g_ord[n] + e_n[n] + gains_n[n]).collect();
        ShortAgg {
            magi_n,
            interest_n,
            gains_n,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn materialize(
        &self,
        x: &[f64],
        ready: &ReadyView,
        tax_sched: &TaxSched,
        sc: &ScQuantities,
        l: &VarLayout,
        objective: Objective,
        status: CaseStatus,
        iterations: usize,
        solver_message: String,
        objective_value: f64,
    ) -> SolvedPlan {
        let mut x = x.to_vec();
        round_cents(&mut x);
        let n_n = self.n_n;
        let n_i = self.n_i;
        let gamma = ready.gamma_n;
        let alpha = ready.alpha_ijkn;
        let tau = ready.tau_kn;

        let mut balances = Grid3::zeros(n_i, N_J, n_n + 1);
        let mut withdrawals = Grid3::zeros(n_i, N_J, n_n);
        let mut deposits = Grid2::zeros(n_i, n_n);
        let mut conversions = Grid2::zeros(n_i, n_n);
        for i in 0..n_i {
            for j in 0..N_J {
                for n in 0..=n_n {
                    balances.set(i, j, n, x[l.ix_b(i, j, n)]);
                }
                for n in 0..n_n {
                    withdrawals.set(i, j, n, x[l.ix_w(i, j, n)]);
                }
            }
            for n in 0..n_n {
                deposits.set(i, n, x[l.ix_d(i, n)]);
                conversions.set(i, n, x[l.ix_x(i, n)]);
            }
        }
        let deduction_used_n = Self::decode(&x, l.c_e, n_n);
        let mut bracket_fill_tn = Grid2::zeros(N_T, n_n);
        for t in 0..N_T {
            for n in 0..n_n {
                bracket_fill_tn.set(t, n, x[l.ix_f(t, n)]);
            }
        }
        let net_spending_n = Self::decode(&x, l.c_g, n_n);
        let m_var_n = Self::decode(&x, l.c_m, n_n);
        let surplus_n = Self::decode(&x, l.c_s, n_n);

        // Taxes by bracket, plus early-withdrawal penalties.
        let mut tax_by_bracket_tn = Grid2::zeros(N_T, n_n);
        let mut ordinary_tax_n = vec![0.0; n_n];
        for t in 0..N_T {
            for n in 0..n_n {
                let v = bracket_fill_tn.at(t, n) * tax_sched.theta_tn.at(t, n);
                tax_by_bracket_tn.set(t, n, v);
                ordinary_tax_n[n] += v;
            }
        }
        let mut penalty_n = vec![0.0; n_n];
        for i in 0..n_i {
            for n in 0..self.n59[i].min(n_n) {
                penalty_n[n] += 0.1 * (withdrawals.at(i, 1, n) + withdrawals.at(i, 2, n));
            }
        }
        for n in 0..n_n {
            ordinary_tax_n[n] += penalty_n[n];
        }

        let short = self.aggregate_short(&x, l, ready);
        let ltcg_tax_n: Vec<f64> = (0..n_n).map(|n| sc.psi_n[n] * short.gains_n[n]).collect();
        let medicare_n: Vec<f64> = (0..n_n).map(|n| m_var_n[n] + sc.m_n[n]).collect();

        // Partial estate at the passing of the first spouse.
        let (partial_estate_j, partial_bequest) = if n_i == 2 && self.n_d < n_n {
            let nx = self.n_d - 1;
            let i_d = self.i_d;
            let mut part_j = [0.0; 3];
            for (j, part) in part_j.iter_mut().enumerate() {
                let ksum: f64 = (0..N_K)
                    .map(|k| alpha.at(i_d, j, k, nx) * tau.at(k, nx))
                    .sum();
                let tauh = 1.0 + 0.5 * ksum;
                let tau1 = 1.0 + ksum;
                *part = tauh * self.kappa_ijn.at(i_d, j, nx)
                    + tau1
                        * (balances.at(i_d, j, nx) - withdrawals.at(i_d, j, nx)
                            + deposits.at(i_d, nx) * krond_f(j, 0)
                            + conversions.at(i_d, nx) * (krond_f(j, 2) - krond_f(j, 1)));
            }
            let mut bequest_j = [0.0; 3];
            for j in 0..3 {
                bequest_j[j] = part_j[j] * (1.0 - self.phi_j[j]);
            }
            bequest_j[1] *= 1.0 - self.nu;
            let total: f64 = bequest_j.iter().sum::<f64>() / gamma[self.n_d];
            (part_j, total)
        } else {
            ([0.0; 3], 0.0)
        };

        let mut rmd_in = Grid2::zeros(n_i, n_n);
        let mut extra_distribution_in = Grid2::zeros(n_i, n_n);
        for i in 0..n_i {
            for n in 0..n_n {
                let rmd = self.rho_in.at(i, n) * balances.at(i, 1, n);
                rmd_in.set(i, n, rmd);
                extra_distribution_in.set(i, n, (withdrawals.at(i, 1, n) - rmd).max(0.0));
            }
        }

        // Final estate: heirs assume the deferred tax, debts are settled.
        let mut estate_j = [0.0; 3];
        for (j, est) in estate_j.iter_mut().enumerate() {
            for i in 0..n_i {
                *est += balances.at(i, j, n_n);
            }
        }
        estate_j[1] *= 1.0 - self.nu;
        let total_estate = estate_j.iter().sum::<f64>() - self.residual_debt;
        let bequest = total_estate.max(0.0) / gamma[n_n];
        let basis = net_spending_n[0] / ready.xi_n[0];

        SolvedPlan {
            case_name: self.name.clone(),
            objective,
            status,
            solver_message,
            iterations,
            timestamp: Zoned::now().strftime("%Y-%m-%d at %H:%M:%S").to_string(),
            nvars: l.nvars,
            ncons: 0,
            year_n: self.year_n.clone(),
            gamma_n: gamma.to_vec(),
            balances,
            deposits,
            deduction_used_n,
            bracket_fill_tn,
            net_spending_n,
            surplus_n,
            withdrawals,
            conversions,
            tax_by_bracket_tn,
            ordinary_tax_n,
            penalty_n,
            ltcg_tax_n,
            niit_n: sc.j_n.clone(),
            medicare_n,
            dividends_gains_n: short.gains_n,
            interest_n: short.interest_n,
            magi_n: short.magi_n,
            psi_n: sc.psi_n.clone(),
            rmd_in,
            extra_distribution_in,
            partial_estate_j,
            partial_bequest,
            basis,
            bequest,
            objective_value,
        }
    }
}

fn krond_f(a: usize, b: usize) -> f64 {
    if a == b { 1.0 } else { 0.0 }
}
