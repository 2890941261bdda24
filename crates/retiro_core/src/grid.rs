//! Dense multi-dimensional arrays with stride-based indexing.
//!
//! The planner works with small fixed-arity tensors (per-individual,
//! per-account, per-asset, per-year). These wrappers store the data in
//! row-major order and precompute nothing beyond the shape; index math is
//! inlined and bounds-checked in debug builds only.

use serde::{Deserialize, Serialize};

/// 2-D array of `f64`, row-major.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grid2 {
    n0: usize,
    n1: usize,
    data: Vec<f64>,
}

impl Grid2 {
    #[must_use]
    pub fn zeros(n0: usize, n1: usize) -> Self {
        Self {
            n0,
            n1,
            data: vec![0.0; n0 * n1],
        }
    }

    #[must_use]
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let n0 = rows.len();
        let n1 = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n0 * n1);
        for row in rows {
            debug_assert_eq!(row.len(), n1);
            data.extend_from_slice(row);
        }
        Self { n0, n1, data }
    }

    #[inline]
    fn idx(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.n0 && j < self.n1, "Grid2 index out of range");
        i * self.n1 + j
    }

    #[inline]
    #[must_use]
    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.data[self.idx(i, j)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, v: f64) {
        let k = self.idx(i, j);
        self.data[k] = v;
    }

    #[inline]
    pub fn add(&mut self, i: usize, j: usize, v: f64) {
        let k = self.idx(i, j);
        self.data[k] += v;
    }

    #[inline]
    pub fn scale(&mut self, fac: f64) {
        for v in &mut self.data {
            *v *= fac;
        }
    }

    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n1..(i + 1) * self.n1]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.n1..(i + 1) * self.n1]
    }

    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.n0, self.n1)
    }

    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }
}

/// 3-D array of `f64`, row-major.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grid3 {
    n0: usize,
    n1: usize,
    n2: usize,
    data: Vec<f64>,
}

impl Grid3 {
    #[must_use]
    pub fn zeros(n0: usize, n1: usize, n2: usize) -> Self {
        Self {
            n0,
            n1,
            n2,
            data: vec![0.0; n0 * n1 * n2],
        }
    }

    #[inline]
    fn idx(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(
            i < self.n0 && j < self.n1 && k < self.n2,
            "Grid3 index out of range"
        );
        (i * self.n1 + j) * self.n2 + k
    }

    #[inline]
    #[must_use]
    pub fn at(&self, i: usize, j: usize, k: usize) -> f64 {
        self.data[self.idx(i, j, k)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, v: f64) {
        let x = self.idx(i, j, k);
        self.data[x] = v;
    }

    #[inline]
    pub fn add(&mut self, i: usize, j: usize, k: usize, v: f64) {
        let x = self.idx(i, j, k);
        self.data[x] += v;
    }

    /// Contiguous innermost slice at `(i, j, ..)`.
    #[must_use]
    pub fn lane(&self, i: usize, j: usize) -> &[f64] {
        let start = (i * self.n1 + j) * self.n2;
        &self.data[start..start + self.n2]
    }

    pub fn lane_mut(&mut self, i: usize, j: usize) -> &mut [f64] {
        let start = (i * self.n1 + j) * self.n2;
        &mut self.data[start..start + self.n2]
    }

    #[must_use]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.n0, self.n1, self.n2)
    }

    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }
}

/// 4-D array of `f64`, row-major.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grid4 {
    n0: usize,
    n1: usize,
    n2: usize,
    n3: usize,
    data: Vec<f64>,
}

impl Grid4 {
    #[must_use]
    pub fn zeros(n0: usize, n1: usize, n2: usize, n3: usize) -> Self {
        Self {
            n0,
            n1,
            n2,
            n3,
            data: vec![0.0; n0 * n1 * n2 * n3],
        }
    }

    #[inline]
    fn idx(&self, i: usize, j: usize, k: usize, l: usize) -> usize {
        debug_assert!(
            i < self.n0 && j < self.n1 && k < self.n2 && l < self.n3,
            "Grid4 index out of range"
        );
        ((i * self.n1 + j) * self.n2 + k) * self.n3 + l
    }

    #[inline]
    #[must_use]
    pub fn at(&self, i: usize, j: usize, k: usize, l: usize) -> f64 {
        self.data[self.idx(i, j, k, l)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, l: usize, v: f64) {
        let x = self.idx(i, j, k, l);
        self.data[x] = v;
    }

    /// Contiguous innermost slice at `(i, j, k, ..)`.
    #[must_use]
    pub fn lane(&self, i: usize, j: usize, k: usize) -> &[f64] {
        let start = ((i * self.n1 + j) * self.n2 + k) * self.n3;
        &self.data[start..start + self.n3]
    }

    pub fn lane_mut(&mut self, i: usize, j: usize, k: usize) -> &mut [f64] {
        let start = ((i * self.n1 + j) * self.n2 + k) * self.n3;
        &mut self.data[start..start + self.n3]
    }

    #[must_use]
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        (self.n0, self.n1, self.n2, self.n3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid2_roundtrip() {
        let mut g = Grid2::zeros(2, 3);
        g.set(1, 2, 4.5);
        g.add(1, 2, 0.5);
        assert_eq!(g.at(1, 2), 5.0);
        assert_eq!(g.row(0), &[0.0, 0.0, 0.0]);
        assert_eq!(g.shape(), (2, 3));
    }

    #[test]
    fn grid3_lanes_are_contiguous() {
        let mut g = Grid3::zeros(2, 2, 4);
        for n in 0..4 {
            g.set(1, 0, n, n as f64);
        }
        assert_eq!(g.lane(1, 0), &[0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn grid4_indexing() {
        let mut g = Grid4::zeros(2, 3, 4, 5);
        g.set(1, 2, 3, 4, 9.0);
        assert_eq!(g.at(1, 2, 3, 4), 9.0);
        assert_eq!(g.lane(1, 2, 3)[4], 9.0);
    }
}
