//! Flat-vector layout of the decision variables.
//!
//! All variable families live in one block vector with the continuous
//! families first and every binary variable at the end. Offsets are the
//! running sum of family sizes in canonical order
//! `b, d, e, f, g, m, s, w, x, zx, zm`; the `zm` family exists only when
//! Medicare is modeled with tier-selection binaries.

use crate::allocation::N_J;
use crate::tax::{N_Q, N_T};

/// Number of exclusion binaries per individual and year
/// (deposit-vs-withdraw, convert-vs-Roth-withdraw).
pub const N_ZX: usize = 2;

/// Offsets and extents of every decision-variable family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarLayout {
    pub n_i: usize,
    pub n_n: usize,
    /// Plan-year index where Medicare starts (for the `zm` block).
    pub medicare_start: usize,
    /// Whether the `zm` tier-selection binaries are present.
    pub with_medicare_binaries: bool,

    pub c_b: usize,
    pub c_d: usize,
    pub c_e: usize,
    pub c_f: usize,
    pub c_g: usize,
    pub c_m: usize,
    pub c_s: usize,
    pub c_w: usize,
    pub c_x: usize,
    pub c_zx: usize,
    pub c_zm: usize,

    pub nvars: usize,
    pub nbins: usize,
}

impl VarLayout {
    #[must_use]
    pub fn new(
        n_i: usize,
        n_n: usize,
        medicare_start: usize,
        with_medicare_binaries: bool,
    ) -> Self {
        let c_b = 0;
        let c_d = c_b + n_i * N_J * (n_n + 1);
        let c_e = c_d + n_i * n_n;
        let c_f = c_e + n_n;
        let c_g = c_f + N_T * n_n;
        let c_m = c_g + n_n;
        let c_s = c_m + n_n;
        let c_w = c_s + n_n;
        let c_x = c_w + n_i * N_J * n_n;
        let c_zx = c_x + n_i * n_n;
        let c_zm = c_zx + n_i * n_n * N_ZX;
        let nvars = if with_medicare_binaries {
            c_zm + (n_n - medicare_start) * (N_Q - 1)
        } else {
            c_zm
        };
        let nbins = nvars - c_zx;

        Self {
            n_i,
            n_n,
            medicare_start,
            with_medicare_binaries,
            c_b,
            c_d,
            c_e,
            c_f,
            c_g,
            c_m,
            c_s,
            c_w,
            c_x,
            c_zx,
            c_zm,
            nvars,
            nbins,
        }
    }

    /// Number of Medicare years covered by the `zm` block.
    #[must_use]
    pub fn n_med(&self) -> usize {
        self.n_n - self.medicare_start
    }

    /// Account balance at the start of year `n`; `n == N_n` is the
    /// terminal estate slice.
    #[inline]
    #[must_use]
    pub fn ix_b(&self, i: usize, j: usize, n: usize) -> usize {
        debug_assert!(i < self.n_i && j < N_J && n <= self.n_n);
        self.c_b + (i * N_J + j) * (self.n_n + 1) + n
    }

    /// Deposit into the taxable account.
    #[inline]
    #[must_use]
    pub fn ix_d(&self, i: usize, n: usize) -> usize {
        debug_assert!(i < self.n_i && n < self.n_n);
        self.c_d + i * self.n_n + n
    }

    /// Usable standard-deduction amount.
    #[inline]
    #[must_use]
    pub fn ix_e(&self, n: usize) -> usize {
        debug_assert!(n < self.n_n);
        self.c_e + n
    }

    /// Taxable ordinary income filling bracket `t`.
    #[inline]
    #[must_use]
    pub fn ix_f(&self, t: usize, n: usize) -> usize {
        debug_assert!(t < N_T && n < self.n_n);
        self.c_f + t * self.n_n + n
    }

    /// Net spending.
    #[inline]
    #[must_use]
    pub fn ix_g(&self, n: usize) -> usize {
        debug_assert!(n < self.n_n);
        self.c_g + n
    }

    /// Medicare + IRMAA cost (when optimized).
    #[inline]
    #[must_use]
    pub fn ix_m(&self, n: usize) -> usize {
        debug_assert!(n < self.n_n);
        self.c_m + n
    }

    /// Cash-flow surplus routed to deposits.
    #[inline]
    #[must_use]
    pub fn ix_s(&self, n: usize) -> usize {
        debug_assert!(n < self.n_n);
        self.c_s + n
    }

    /// Withdrawal from account `j`.
    #[inline]
    #[must_use]
    pub fn ix_w(&self, i: usize, j: usize, n: usize) -> usize {
        debug_assert!(i < self.n_i && j < N_J && n < self.n_n);
        self.c_w + (i * N_J + j) * self.n_n + n
    }

    /// Roth conversion from tax-deferred into tax-free.
    #[inline]
    #[must_use]
    pub fn ix_x(&self, i: usize, n: usize) -> usize {
        debug_assert!(i < self.n_i && n < self.n_n);
        self.c_x + i * self.n_n + n
    }

    /// Exclusion binary `z` of pair slot `zi`.
    #[inline]
    #[must_use]
    pub fn ix_zx(&self, i: usize, n: usize, zi: usize) -> usize {
        debug_assert!(i < self.n_i && n < self.n_n && zi < N_ZX);
        self.c_zx + (i * self.n_n + n) * N_ZX + zi
    }

    /// Medicare tier selector for Medicare-year `nn` and tier `q`.
    #[inline]
    #[must_use]
    pub fn ix_zm(&self, nn: usize, q: usize) -> usize {
        debug_assert!(self.with_medicare_binaries);
        debug_assert!(nn < self.n_med() && q < N_Q - 1);
        self.c_zm + nn * (N_Q - 1) + q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_contiguous() {
        let l = VarLayout::new(2, 10, 3, true);
        assert_eq!(l.c_b, 0);
        assert_eq!(l.c_d, 2 * 3 * 11);
        assert_eq!(l.c_e, l.c_d + 2 * 10);
        assert_eq!(l.c_f, l.c_e + 10);
        assert_eq!(l.c_g, l.c_f + 7 * 10);
        assert_eq!(l.c_m, l.c_g + 10);
        assert_eq!(l.c_s, l.c_m + 10);
        assert_eq!(l.c_w, l.c_s + 10);
        assert_eq!(l.c_x, l.c_w + 2 * 3 * 10);
        assert_eq!(l.c_zx, l.c_x + 2 * 10);
        assert_eq!(l.c_zm, l.c_zx + 2 * 10 * 2);
        assert_eq!(l.nvars, l.c_zm + 7 * 5);
        assert_eq!(l.nbins, l.nvars - l.c_zx);
    }

    #[test]
    fn no_medicare_binaries_shrinks_vector() {
        let with = VarLayout::new(1, 10, 0, true);
        let without = VarLayout::new(1, 10, 0, false);
        assert_eq!(without.nvars, without.c_zm);
        assert!(with.nvars > without.nvars);
        assert_eq!(without.nbins, 1 * 10 * 2);
    }

    #[test]
    fn index_mapping_is_dense_and_ordered() {
        let l = VarLayout::new(2, 5, 2, true);
        assert_eq!(l.ix_b(0, 0, 0), 0);
        assert_eq!(l.ix_b(0, 0, 1), 1);
        assert_eq!(l.ix_b(0, 1, 0), 6);
        assert_eq!(l.ix_b(1, 0, 0), 18);
        assert_eq!(l.ix_d(0, 0), l.c_d);
        assert_eq!(l.ix_w(1, 2, 4), l.c_x - 1);
        assert_eq!(l.ix_zx(1, 4, 1), l.c_zm - 1);
        assert_eq!(l.ix_zm(0, 0), l.c_zm);
        assert_eq!(l.ix_zm(2, 4), l.nvars - 1);
    }

    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn out_of_range_index_asserts() {
        let l = VarLayout::new(1, 5, 0, false);
        let _ = l.ix_g(5);
    }
}
