//! Constraint and objective emission.
//!
//! Translates a configured [`Plan`](crate::plan::Plan), the current
//! self-consistent quantities, and the solve options into a solver-neutral
//! [`LpModel`]. One private function per constraint family; the emission
//! order follows the canonical variable layout.

use crate::allocation::N_J;
use crate::error::{PlanError, Result};
use crate::grid::Grid3;
use crate::layout::VarLayout;
use crate::lp::{ConstraintMatrix, LpModel, Row, VarBounds};
use crate::plan::{
    BaseSchedules, MedicareMode, Objective, Plan, ReadyView, ResolvedOptions, RothConversionCap,
    ScQuantities, TaxSched,
};
use crate::rates::N_K;
use crate::tax::{N_Q, N_T};

// Assumed annual growth applied to Roth amounts from the five years
// preceding the plan, where actual returns are unknown.
const PAST_ROTH_GROWTH: f64 = 1.10;

// Early-withdrawal penalty rate before age 59 1/2.
const EARLY_WITHDRAWAL_PENALTY: f64 = 0.10;

const INF: f64 = f64::INFINITY;

fn krond(a: usize, b: usize) -> f64 {
    if a == b { 1.0 } else { 0.0 }
}

struct Ctx<'a> {
    plan: &'a Plan,
    ready: &'a ReadyView<'a>,
    base: &'a BaseSchedules,
    tax: &'a TaxSched,
    sc: &'a ScQuantities,
    l: &'a VarLayout,
    opts: &'a ResolvedOptions,
    a: ConstraintMatrix,
    b: VarBounds,
}

/// Build the complete model for one solver invocation.
#[allow(clippy::too_many_arguments)]
pub(crate) fn build_model(
    plan: &Plan,
    ready: &ReadyView<'_>,
    base: &BaseSchedules,
    tax: &TaxSched,
    sc: &ScQuantities,
    layout: &VarLayout,
    objective: Objective,
    opts: &ResolvedOptions,
) -> Result<LpModel> {
    let mut ctx = Ctx {
        plan,
        ready,
        base,
        tax,
        sc,
        l: layout,
        opts,
        a: ConstraintMatrix::new(layout.nvars),
        b: VarBounds::new(layout.nvars, layout.nbins),
    };

    ctx.add_rmd_inequalities();
    ctx.add_tax_bracket_bounds();
    ctx.add_standard_deduction_bounds();
    ctx.add_defunct_bounds();
    ctx.add_roth_conversion_controls()?;
    ctx.add_roth_maturation_rows();
    ctx.add_withdrawal_limits();
    ctx.add_conversion_limits();
    ctx.add_objective_constraints(objective)?;
    ctx.add_initial_balances();
    ctx.add_surplus_deposit_linking();
    ctx.add_account_balance_carryover();
    ctx.add_net_cash_flow();
    ctx.add_spending_profile_rows();
    ctx.add_taxable_income_rows();
    ctx.add_medicare_tier_selection();
    ctx.add_medicare_cost_rows();
    ctx.add_exclusion_rows();

    let objective_vec = ctx.build_objective_vector(objective);
    log::debug!(
        "model has {} constraints over {} variables ({} binary)",
        ctx.a.ncons(),
        layout.nvars,
        layout.nbins
    );

    Ok(LpModel {
        matrix: ctx.a,
        bounds: ctx.b,
        objective: objective_vec,
    })
}

impl Ctx<'_> {
    fn tau(&self, k: usize, n: usize) -> f64 {
        self.ready.tau_kn.at(k, n)
    }

    fn alpha(&self, i: usize, j: usize, k: usize, n: usize) -> f64 {
        self.ready.alpha_ijkn.at(i, j, k, n)
    }

    /// Portfolio-weighted return for `(i, j)` in year `n`.
    fn tau_ij(&self, i: usize, j: usize, n: usize) -> f64 {
        (0..N_K).map(|k| self.alpha(i, j, k, n) * self.tau(k, n)).sum()
    }

    /// Contribution with tail access: the five years preceding the plan are
    /// stored at the end of the array.
    fn kappa(&self, i: usize, j: usize, nn: isize) -> f64 {
        let cols = (self.l.n_n + 5) as isize;
        let idx = if nn >= 0 { nn } else { cols + nn };
        self.plan.kappa_ijn.at(i, j, idx as usize)
    }

    fn roth_x(&self, i: usize, nn: isize) -> f64 {
        let cols = (self.l.n_n + 5) as isize;
        let idx = if nn >= 0 { nn } else { cols + nn };
        self.plan.roth_x_in.at(i, idx as usize)
    }

    /// Prior-year stock return clamped at zero, used for the capital-gains
    /// component of taxable withdrawals. Year 0 rolls in a zero.
    fn tau_stock_prev(&self, n: usize) -> f64 {
        if n == 0 {
            0.0
        } else {
            self.tau(0, n - 1).max(0.0)
        }
    }

    // Withdrawals from tax-deferred accounts must cover the RMD fraction of
    // the running balance.
    fn add_rmd_inequalities(&mut self) {
        let l = self.l;
        for i in 0..self.plan.n_i {
            if self.ready.beta_ij.at(i, 1) > 0.0 {
                for n in 0..self.plan.horizons[i] {
                    self.a.add_new_row(
                        &[
                            (l.ix_w(i, 1, n), 1.0),
                            (l.ix_b(i, 1, n), -self.plan.rho_in.at(i, n)),
                        ],
                        0.0,
                        INF,
                    );
                }
            }
        }
    }

    fn add_tax_bracket_bounds(&mut self) {
        for t in 0..N_T {
            for n in 0..self.l.n_n {
                self.b
                    .set_range(self.l.ix_f(t, n), 0.0, self.tax.delta_bar_tn.at(t, n));
            }
        }
    }

    fn add_standard_deduction_bounds(&mut self) {
        for n in 0..self.l.n_n {
            self.b
                .set_range(self.l.ix_e(n), 0.0, self.tax.sigma_bar_n[n]);
        }
    }

    // After the first passing, the deceased neither deposits, converts,
    // nor withdraws.
    fn add_defunct_bounds(&mut self) {
        if self.plan.n_i == 2 {
            let i_d = self.plan.i_d;
            for n in self.plan.n_d..self.l.n_n {
                self.b.set_range(self.l.ix_d(i_d, n), 0.0, 0.0);
                self.b.set_range(self.l.ix_x(i_d, n), 0.0, 0.0);
                for j in 0..N_J {
                    self.b.set_range(self.l.ix_w(i_d, j, n), 0.0, 0.0);
                }
            }
        }
    }

    fn add_roth_conversion_controls(&mut self) -> Result<()> {
        let l = self.l;
        match &self.opts.max_roth_conversion {
            Some(RothConversionCap::FromTable) => {
                // Pin conversions to the prescribed schedule.
                for i in 0..self.plan.n_i {
                    for n in 0..self.plan.horizons[i] {
                        let rhs = self.roth_x(i, n as isize);
                        self.b.set_range(l.ix_x(i, n), rhs, rhs);
                    }
                }
                return Ok(());
            }
            Some(RothConversionCap::Amount(amount)) => {
                if *amount >= 0.0 {
                    let cap = amount * self.opts.units + 0.01;
                    for i in 0..self.plan.n_i {
                        for n in 0..self.plan.horizons[i] {
                            self.b.set_range(l.ix_x(i, n), 0.0, cap);
                        }
                    }
                }
            }
            None => {}
        }

        if let Some(year) = self.opts.start_roth_year {
            let yearn = (year - self.plan.this_year).max(0) as usize;
            for i in 0..self.plan.n_i {
                let nstart = yearn.min(self.plan.horizons[i]);
                for n in 0..nstart {
                    self.b.set_range(l.ix_x(i, n), 0.0, 0.0);
                }
            }
        }

        if let Some(i_x) = self.opts.no_roth_idx {
            for n in 0..l.n_n {
                self.b.set_range(l.ix_x(i_x, n), 0.0, 0.0);
            }
        }

        Ok(())
    }

    // Five-year rule: conversions and their compounded gains, and the gains
    // on recent contributions, are retained in the tax-free account. Years
    // before the plan use an assumed growth rate and the tail-stored
    // contribution history.
    fn add_roth_maturation_rows(&mut self) {
        let l = self.l;
        for i in 0..self.plan.n_i {
            for n in 0..self.plan.horizons[i] {
                let mut rhs = 0.0;
                let mut cgains = 1.0;
                let mut row = Row::new();
                row.add(l.ix_b(i, 2, n), 1.0);
                row.add(l.ix_w(i, 2, n), -1.0);
                for dn in 1..=5 {
                    let nn = n as isize - dn;
                    if nn >= 0 {
                        let tau1 = 1.0 + self.tau_ij(i, 2, nn as usize);
                        // Ignore market downs.
                        cgains *= tau1.max(1.0);
                        row.add(l.ix_x(i, nn as usize), -cgains);
                        // A contribution retains only its gains, not the
                        // deposited amount.
                        rhs += (cgains - 1.0) * self.kappa(i, 2, nn);
                    } else {
                        cgains *= PAST_ROTH_GROWTH;
                        rhs += (cgains - 1.0) * self.kappa(i, 2, nn)
                            + cgains * self.roth_x(i, nn);
                    }
                }
                self.a.add_row(row, rhs, INF);
            }
        }
    }

    // Taxable and tax-free withdrawals cannot exceed the running balance.
    fn add_withdrawal_limits(&mut self) {
        let l = self.l;
        for i in 0..self.plan.n_i {
            for j in [0, 2] {
                for n in 0..l.n_n {
                    self.a.add_new_row(
                        &[(l.ix_w(i, j, n), -1.0), (l.ix_b(i, j, n), 1.0)],
                        0.0,
                        INF,
                    );
                }
            }
        }
    }

    // Tax-deferred withdrawals and Roth conversions compete for the same
    // balance.
    fn add_conversion_limits(&mut self) {
        let l = self.l;
        for i in 0..self.plan.n_i {
            for n in 0..l.n_n {
                self.a.add_new_row(
                    &[
                        (l.ix_x(i, n), -1.0),
                        (l.ix_w(i, 1, n), -1.0),
                        (l.ix_b(i, 1, n), 1.0),
                    ],
                    0.0,
                    INF,
                );
            }
        }
    }

    fn add_objective_constraints(&mut self, objective: Objective) -> Result<()> {
        let l = self.l;
        match objective {
            Objective::MaxSpending => {
                let gamma_last = self.ready.gamma_n[l.n_n];
                let bequest = match self.opts.bequest {
                    Some(b) => b * self.opts.units * gamma_last,
                    None => 1.0,
                };
                // The estate constraint covers savings accounts only; fixed
                // assets and residual debt are settled outside the model.
                let total = bequest + self.plan.residual_debt;
                let mut row = Row::new();
                for i in 0..self.plan.n_i {
                    row.add(l.ix_b(i, 0, l.n_n), 1.0);
                    row.add(l.ix_b(i, 1, l.n_n), 1.0 - self.plan.nu);
                    row.add(l.ix_b(i, 2, l.n_n), 1.0);
                }
                self.a.add_row(row, total, total);
            }
            Objective::MaxBequest => {
                let spending = self
                    .opts
                    .net_spending
                    .ok_or_else(|| PlanError::config("maxBequest requires a netSpending option"))?
                    * self.opts.units;
                self.b.set_range(l.ix_g(0), spending, spending);
            }
        }
        Ok(())
    }

    // Back-project today's balances to the beginning of the year and pin
    // the initial slice.
    fn add_initial_balances(&mut self) {
        let year_spent = 1.0 - self.plan.year_frac_left;
        for i in 0..self.plan.n_i {
            for j in 0..N_J {
                let back_tau = 1.0 + year_spent * self.tau_ij(i, j, 0);
                let rhs = self.ready.beta_ij.at(i, j) / back_tau;
                self.b.set_range(self.l.ix_b(i, j, 0), rhs, rhs);
            }
        }
    }

    // Surplus splits into taxable deposits by the spousal fraction before
    // the first passing, and flows entirely to the survivor after.
    fn add_surplus_deposit_linking(&mut self) {
        let l = self.l;
        let eta = self.plan.eta;
        for i in 0..self.plan.n_i {
            let fac1 = krond(i, 0) * (1.0 - eta) + krond(i, 1) * eta;
            for n in 0..self.plan.n_d {
                self.a
                    .add_new_row(&[(l.ix_d(i, n), 1.0), (l.ix_s(n), -fac1)], 0.0, 0.0);
            }
            let fac2 = match self.plan.i_s {
                Some(i_s) => krond(i_s, i),
                None => 0.0,
            };
            for n in self.plan.n_d..l.n_n {
                self.a
                    .add_new_row(&[(l.ix_d(i, n), 1.0), (l.ix_s(n), -fac2)], 0.0, 0.0);
            }
        }
        // A last-year deposit would be a tax loophole.
        self.b.set_range(l.ix_s(l.n_n - 1), 0.0, 0.0);
    }

    // Balance transition law, with the survivor receiving the beneficiary
    // fraction of the deceased's post-year amounts in the transfer year.
    fn add_account_balance_carryover(&mut self) {
        let l = self.l;
        let n_n = l.n_n;
        let n_i = self.plan.n_i;
        let two_spouse_transfer = n_i == 2 && self.plan.n_d < n_n;

        let mut tau1 = Grid3::zeros(n_i, N_J, n_n);
        let mut tauh = Grid3::zeros(n_i, N_J, n_n);
        for i in 0..n_i {
            for j in 0..N_J {
                for n in 0..n_n {
                    let t = self.tau_ij(i, j, n);
                    tau1.set(i, j, n, 1.0 + t);
                    tauh.set(i, j, n, 1.0 + t / 2.0);
                }
            }
        }

        let xnet = self.opts.xnet;
        for i in 0..n_i {
            for j in 0..N_J {
                for n in 0..n_n {
                    let fac1 = if two_spouse_transfer && i == self.plan.i_d && n == self.plan.n_d - 1
                    {
                        0.0
                    } else {
                        1.0
                    };

                    let mut rhs = fac1 * self.kappa(i, j, n as isize) * tauh.at(i, j, n);
                    let mut row = Row::new();
                    row.add(l.ix_b(i, j, n + 1), 1.0);
                    row.add(l.ix_b(i, j, n), -fac1 * tau1.at(i, j, n));
                    row.add(l.ix_w(i, j, n), fac1 * tau1.at(i, j, n));
                    row.add(l.ix_d(i, n), -fac1 * krond(j, 0) * tau1.at(i, 0, n));
                    row.add(
                        l.ix_x(i, n),
                        -fac1 * (xnet * krond(j, 2) - krond(j, 1)) * tau1.at(i, j, n),
                    );

                    if two_spouse_transfer
                        && Some(i) == self.plan.i_s
                        && n == self.plan.n_d - 1
                    {
                        let i_d = self.plan.i_d;
                        let fac2 = self.plan.phi_j[j];
                        rhs += fac2 * self.kappa(i_d, j, n as isize) * tauh.at(i_d, j, n);
                        row.add(l.ix_b(i_d, j, n), -fac2 * tau1.at(i_d, j, n));
                        row.add(l.ix_w(i_d, j, n), fac2 * tau1.at(i_d, j, n));
                        row.add(l.ix_d(i_d, n), -fac2 * krond(j, 0) * tau1.at(i_d, 0, n));
                        row.add(
                            l.ix_x(i_d, n),
                            -fac2 * (xnet * krond(j, 2) - krond(j, 1)) * tau1.at(i_d, j, n),
                        );
                    }
                    self.a.add_row(row, rhs, rhs);
                }
            }
        }
    }

    // Yearly cash balance: spending, surplus, Medicare, taxes, dividends,
    // withdrawals net of penalties, and all exogenous streams.
    fn add_net_cash_flow(&mut self) {
        let l = self.l;
        let mu = self.plan.mu;
        for n in 0..l.n_n {
            let mut rhs = -self.sc.m_n[n] - self.sc.j_n[n];
            rhs += self.plan.fa_tax_free_n[n];
            rhs -= self.plan.debt_payments_n[n];

            let mut row = Row::new();
            row.add(l.ix_g(n), 1.0);
            row.add(l.ix_s(n), 1.0);
            row.add(l.ix_m(n), 1.0);
            for i in 0..self.plan.n_i {
                let fac = self.sc.psi_n[n] * self.alpha(i, 0, 0, n);
                rhs += self.plan.omega_in.at(i, n)
                    + self.base.zeta_bar_in.at(i, n)
                    + self.base.pi_bar_in.at(i, n)
                    + self.plan.big_ticket_in.at(i, n)
                    - 0.5 * fac * mu * self.kappa(i, 0, n as isize);
                row.add(l.ix_b(i, 0, n), fac * mu);
                row.add(
                    l.ix_w(i, 0, n),
                    fac * (self.tau_stock_prev(n) - mu) - 1.0,
                );
                let penalty = if n < self.plan.n59[i] {
                    EARLY_WITHDRAWAL_PENALTY
                } else {
                    0.0
                };
                row.add(l.ix_w(i, 1, n), -1.0 + penalty);
                row.add(l.ix_w(i, 2, n), -1.0 + penalty);
                row.add(l.ix_d(i, n), fac * mu);
            }
            for t in 0..N_T {
                row.add(l.ix_f(t, n), self.tax.theta_tn.at(t, n));
            }
            self.a.add_row(row, rhs, rhs);
        }
    }

    // Keep net spending within the slack corridor around the profile.
    fn add_spending_profile_rows(&mut self) {
        let l = self.l;
        let sp_lo = 1.0 - self.opts.slack;
        let sp_hi = 1.0 + self.opts.slack;
        let xi = &self.base.xi_bar_n;
        for n in 1..l.n_n {
            self.a.add_new_row(
                &[(l.ix_g(0), sp_lo * xi[n]), (l.ix_g(n), -xi[0])],
                -INF,
                0.0,
            );
            self.a.add_new_row(
                &[(l.ix_g(0), sp_hi * xi[n]), (l.ix_g(n), -xi[0])],
                0.0,
                INF,
            );
        }
    }

    // Taxable ordinary income: deduction + bracket fills balance wages,
    // pensions, the taxable share of Social Security, tax-deferred
    // withdrawals, conversions, and interest from non-equity holdings in
    // the taxable account.
    fn add_taxable_income_rows(&mut self) {
        let l = self.l;
        for n in 0..l.n_n {
            let mut rhs = self.plan.fa_ordinary_n[n];
            let mut row = Row::new();
            row.add(l.ix_e(n), 1.0);
            for i in 0..self.plan.n_i {
                rhs += self.plan.omega_in.at(i, n)
                    + 0.85 * self.base.zeta_bar_in.at(i, n)
                    + self.base.pi_bar_in.at(i, n);
                row.add(l.ix_w(i, 1, n), -1.0);
                row.add(l.ix_x(i, n), -1.0);
                let fak: f64 = (1..N_K)
                    .map(|k| self.tau(k, n) * self.alpha(i, 0, k, n))
                    .sum();
                rhs += 0.5 * fak * self.kappa(i, 0, n as isize);
                row.add(l.ix_b(i, 0, n), -fak);
                row.add(l.ix_w(i, 0, n), fak);
                row.add(l.ix_d(i, n), -fak);
            }
            for t in 0..N_T {
                row.add(l.ix_f(t, n), 1.0);
            }
            self.a.add_row(row, rhs, rhs);
        }
    }

    // Big-M pairs expressing "selector is on iff look-back AGI reaches the
    // tier threshold". The earliest Medicare years fall back to the
    // caller-supplied MAGI history.
    fn add_medicare_tier_selection(&mut self) {
        if self.opts.medicare != MedicareMode::Optimize {
            return;
        }
        let l = self.l;
        let big_m = self.opts.big_m;
        let nm = self.base.medicare.start;
        let n_med = l.n_med();
        let thresholds = &self.base.medicare.thresholds;

        let offset = if nm < 2 { 2 - nm } else { 0 };
        for nn in 0..offset.min(n_med) {
            let n = nm + nn;
            for q in 0..N_Q - 1 {
                let magi = self.opts.prev_magi[n];
                self.a.add_new_row(
                    &[(l.ix_zm(nn, q), big_m)],
                    -INF,
                    big_m - thresholds.at(nn, q) + magi,
                );
                self.a.add_new_row(
                    &[(l.ix_zm(nn, q), -big_m)],
                    -INF,
                    thresholds.at(nn, q) - magi,
                );
            }
        }

        for nn in offset..n_med {
            // Premiums look back two years.
            let n2 = nm + nn - 2;
            for q in 0..N_Q - 1 {
                let mut rhs1 = big_m - thresholds.at(nn, q);
                let mut rhs2 = thresholds.at(nn, q);
                let mut row1 = Row::new();
                let mut row2 = Row::new();
                row1.add(l.ix_zm(nn, q), big_m);
                row2.add(l.ix_zm(nn, q), -big_m);
                for i in 0..self.plan.n_i {
                    row1.add(l.ix_w(i, 1, n2), -1.0);
                    row2.add(l.ix_w(i, 1, n2), 1.0);
                    row1.add(l.ix_x(i, n2), -1.0);
                    row2.add(l.ix_x(i, n2), 1.0);

                    // Dividends and interest gains for the look-back year.
                    let afac = self.plan.mu * self.alpha(i, 0, 0, n2)
                        + (1..N_K)
                            .map(|k| self.alpha(i, 0, k, n2) * self.tau(k, n2))
                            .sum::<f64>();
                    row1.add(l.ix_b(i, 0, n2), -afac);
                    row2.add(l.ix_b(i, 0, n2), afac);
                    row1.add(l.ix_d(i, n2), -afac);
                    row2.add(l.ix_d(i, n2), afac);

                    // Strip last year's realized stock gain to avoid double
                    // counting it in the withdrawal term.
                    let bfac = self.alpha(i, 0, 0, n2)
                        * self.tau(0, n2.saturating_sub(1)).max(0.0);
                    row1.add(l.ix_w(i, 0, n2), afac - bfac);
                    row2.add(l.ix_w(i, 0, n2), -afac + bfac);

                    let sumoni = self.plan.omega_in.at(i, n2)
                        + self.sc.psi_n[n2] * self.base.zeta_bar_in.at(i, n2)
                        + self.base.pi_bar_in.at(i, n2)
                        + 0.5 * self.kappa(i, 0, n2 as isize) * afac;
                    rhs1 += sumoni;
                    rhs2 -= sumoni;
                }
                self.a.add_row(row1, -INF, rhs1);
                self.a.add_row(row2, -INF, rhs2);
            }
        }
    }

    // Medicare cost equals the basic premium plus the selected incremental
    // tier costs; zero before eligibility.
    fn add_medicare_cost_rows(&mut self) {
        if self.opts.medicare != MedicareMode::Optimize {
            return;
        }
        let l = self.l;
        let nm = self.base.medicare.start;
        for n in 0..nm {
            self.b.set_range(l.ix_m(n), 0.0, 0.0);
        }
        let costs = &self.base.medicare.costs;
        for nn in 0..l.n_med() {
            let n = nm + nn;
            let base = costs.at(nn, 0);
            let mut row = Row::new();
            row.add(l.ix_m(n), 1.0);
            for q in 0..N_Q - 1 {
                row.add(l.ix_zm(nn, q), -(costs.at(nn, q + 1) - base));
            }
            self.a.add_row(row, base, base);
        }
    }

    // Surplus deposits and discretionary withdrawals do not coexist, nor do
    // Roth conversions and Roth withdrawals.
    fn add_exclusion_rows(&mut self) {
        if !self.opts.xor_constraints {
            return;
        }
        let l = self.l;
        let big_m = self.opts.big_m;
        for i in 0..self.plan.n_i {
            for n in 0..self.plan.horizons[i] {
                self.a.add_new_row(
                    &[(l.ix_zx(i, n, 0), big_m), (l.ix_s(n), -1.0)],
                    0.0,
                    big_m,
                );
                self.a.add_new_row(
                    &[
                        (l.ix_zx(i, n, 0), big_m),
                        (l.ix_w(i, 0, n), 1.0),
                        (l.ix_w(i, 2, n), 1.0),
                    ],
                    0.0,
                    big_m,
                );
                self.a.add_new_row(
                    &[(l.ix_zx(i, n, 1), big_m), (l.ix_x(i, n), -1.0)],
                    0.0,
                    big_m,
                );
                self.a.add_new_row(
                    &[(l.ix_zx(i, n, 1), big_m), (l.ix_w(i, 2, n), 1.0)],
                    0.0,
                    big_m,
                );
            }
            for n in self.plan.horizons[i]..l.n_n {
                self.b.set_range(l.ix_zx(i, n, 0), 0.0, 0.0);
                self.b.set_range(l.ix_zx(i, n, 1), 0.0, 0.0);
            }
        }
    }

    fn build_objective_vector(&self, objective: Objective) -> Vec<f64> {
        let l = self.l;
        let mut c = vec![0.0; l.nvars];
        match objective {
            Objective::MaxSpending => {
                for n in 0..l.n_n {
                    c[l.ix_g(n)] = -1.0 / self.ready.gamma_n[n];
                }
            }
            Objective::MaxBequest => {
                for i in 0..self.plan.n_i {
                    c[l.ix_b(i, 0, l.n_n)] = -1.0;
                    c[l.ix_b(i, 1, l.n_n)] = -(1.0 - self.plan.nu);
                    c[l.ix_b(i, 2, l.n_n)] = -1.0;
                }
            }
        }
        c
    }
}
