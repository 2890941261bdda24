//! Immutable solved-plan snapshots.
//!
//! A successful solve decodes the primal vector into named yearly arrays.
//! The snapshot is detached from the mutable [`Plan`](crate::plan::Plan)
//! so sweeps and UI layers can consume results without holding the inputs.

use serde::{Deserialize, Serialize};

use crate::grid::{Grid2, Grid3};
use crate::plan::Objective;
use crate::tax::BRACKET_NAMES;

/// Terminal state of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaseStatus {
    /// Converged within tolerance (or loop disabled).
    Solved,
    /// Hit the iteration cap; last iterate reported.
    Partial,
    /// Hit the wall-time cap; last feasible iterate reported.
    TimedOut,
}

/// Decoded solution arrays plus provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolvedPlan {
    pub case_name: String,
    pub objective: Objective,
    pub status: CaseStatus,
    pub solver_message: String,
    pub iterations: usize,
    pub timestamp: String,
    pub nvars: usize,
    pub ncons: usize,

    /// Calendar years covered by the plan.
    pub year_n: Vec<i32>,
    /// Cumulative inflation, `N_n + 1` entries.
    pub gamma_n: Vec<f64>,

    /// Account balances `(N_i, N_j, N_n + 1)`; the last slice is the
    /// terminal estate.
    pub balances: Grid3,
    /// Taxable-account deposits `(N_i, N_n)`.
    pub deposits: Grid2,
    /// Standard deduction actually used.
    pub deduction_used_n: Vec<f64>,
    /// Ordinary income filling each tax bracket `(N_t, N_n)`.
    pub bracket_fill_tn: Grid2,
    /// Net spending.
    pub net_spending_n: Vec<f64>,
    /// Cash-flow surplus routed to deposits.
    pub surplus_n: Vec<f64>,
    /// Withdrawals `(N_i, N_j, N_n)`.
    pub withdrawals: Grid3,
    /// Roth conversions `(N_i, N_n)`.
    pub conversions: Grid2,

    /// Ordinary income tax by bracket `(N_t, N_n)`.
    pub tax_by_bracket_tn: Grid2,
    /// Total ordinary income tax including early-withdrawal penalties.
    pub ordinary_tax_n: Vec<f64>,
    /// Early-withdrawal penalties.
    pub penalty_n: Vec<f64>,
    /// Tax on long-term capital gains and dividends.
    pub ltcg_tax_n: Vec<f64>,
    /// Net investment income tax.
    pub niit_n: Vec<f64>,
    /// Medicare and IRMAA premiums (optimized variable plus loop costs).
    pub medicare_n: Vec<f64>,
    /// Dividends and realized gains in the taxable account.
    pub dividends_gains_n: Vec<f64>,
    /// Interest from non-equity holdings in the taxable account.
    pub interest_n: Vec<f64>,
    /// Modified adjusted gross income.
    pub magi_n: Vec<f64>,
    /// Long-term capital gains rate band applied per year.
    pub psi_n: Vec<f64>,

    /// Required minimum distributions `(N_i, N_n)`.
    pub rmd_in: Grid2,
    /// Tax-deferred distributions above the RMD `(N_i, N_n)`.
    pub extra_distribution_in: Grid2,

    /// Estate of the deceased at the first passing, by account type
    /// (nominal dollars at `n_d`).
    pub partial_estate_j: [f64; 3],
    /// Post-tax non-spousal bequest at the first passing, in today's
    /// dollars.
    pub partial_bequest: f64,

    /// Net-spending basis in today's dollars (`g_0 / xi_0`).
    pub basis: f64,
    /// After-tax final bequest in today's dollars.
    pub bequest: f64,
    /// Raw solver objective value (minimized).
    pub objective_value: f64,
}

impl SolvedPlan {
    /// The headline number for the configured objective: the spending basis
    /// for `MaxSpending`, the final bequest for `MaxBequest`.
    #[must_use]
    pub fn objective_result(&self) -> f64 {
        match self.objective {
            Objective::MaxSpending => self.basis,
            Objective::MaxBequest => self.bequest,
        }
    }

    /// Textual synopsis, nominal totals bracketed, today's dollars plain.
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        let n_n = self.net_spending_n.len();
        let today = |v: f64, n: usize| v / self.gamma_n[n];
        let sum_today = |vals: &[f64]| -> f64 {
            vals.iter().enumerate().map(|(n, v)| today(*v, n)).sum()
        };

        let mut lines = Vec::new();
        lines.push(format!("Case name: {}", self.case_name));
        lines.push(format!("Case status: {:?}", self.status));
        lines.push(format!("Net yearly spending basis: ${:.0}", self.basis));
        lines.push(format!(
            "Net spending for year {}: ${:.0}",
            self.year_n[0], self.net_spending_n[0]
        ));

        let tot: f64 = self.net_spending_n.iter().sum();
        lines.push(format!(
            " Total net spending: ${:.0}  [${:.0}]",
            sum_today(&self.net_spending_n),
            tot
        ));

        let conv: f64 = self.conversions.data().iter().sum();
        lines.push(format!(" Total Roth conversions: [${conv:.0}]"));

        let tax: f64 = self.ordinary_tax_n.iter().sum();
        lines.push(format!(
            " Total tax paid on ordinary income: ${:.0}  [${:.0}]",
            sum_today(&self.ordinary_tax_n),
            tax
        ));
        for (t, name) in BRACKET_NAMES.iter().enumerate() {
            let sub: f64 = self.tax_by_bracket_tn.row(t).iter().sum();
            if sub > 0.0 {
                lines.push(format!("  Subtotal in tax bracket {name}: [${sub:.0}]"));
            }
        }
        let pen: f64 = self.penalty_n.iter().sum();
        if pen > 0.0 {
            lines.push(format!("  Subtotal in early withdrawal penalty: [${pen:.0}]"));
        }

        let ltcg: f64 = self.ltcg_tax_n.iter().sum();
        lines.push(format!(
            " Total tax paid on gains and dividends: [${ltcg:.0}]"
        ));
        let niit: f64 = self.niit_n.iter().sum();
        lines.push(format!(" Total net investment income tax paid: [${niit:.0}]"));
        let medicare: f64 = self.medicare_n.iter().sum();
        lines.push(format!(" Total Medicare premiums paid: [${medicare:.0}]"));

        if self.partial_bequest > 0.0 {
            lines.push(format!(
                "Partial bequest at first passing: ${:.0}",
                self.partial_bequest
            ));
        }
        lines.push(format!(
            "Year of final bequest: {}",
            self.year_n[n_n - 1]
        ));
        lines.push(format!(
            " Total after-tax value of final bequest: ${:.0}  [${:.0}]",
            self.bequest,
            self.bequest * self.gamma_n[n_n]
        ));
        lines.push(format!(
            "Cumulative inflation factor at end of final year: {:.2}",
            self.gamma_n[n_n]
        ));
        lines.push(format!(
            "Number of decision variables: {} / constraints: {}",
            self.nvars, self.ncons
        ));
        lines.push(format!("Case executed on: {}", self.timestamp));
        lines
    }
}
