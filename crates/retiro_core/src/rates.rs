//! Annual rate-of-return generation for the four asset classes.
//!
//! Rates are stored in decimal internally; the public API accepts percent.
//! A [`RateModel`] is built from a [`RateMethod`] and produces a
//! `N_K x N` series via [`RateModel::gen_series`]. Deterministic methods
//! always reproduce the same series; stochastic methods draw from a
//! multivariate Gaussian parameterized either from a historical window
//! (`Histochastic`) or directly (`Stochastic`).

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::grid::Grid2;
use crate::history;

/// Number of asset classes: stocks, Baa corporate bonds, T-notes,
/// inflation-indexed/cash. The last class's rate is the inflation rate.
pub const N_K: usize = 4;

// Average rates over the last 30 years of data.
const DEFAULT_RATES: [f64; N_K] = [0.1101, 0.0736, 0.0503, 0.0251];

// Average predictions of major firms as reported by MorningStar in 2023.
const OPTIMISTIC_RATES: [f64; N_K] = [0.086, 0.049, 0.033, 0.025];

const CONSERVATIVE_RATES: [f64; N_K] = [0.06, 0.04, 0.033, 0.028];

/// Correlation input for the `Stochastic` method: either the full matrix or
/// the strict upper triangle in row-major order (6 values for 4 assets).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrelationSpec {
    Full([[f64; N_K]; N_K]),
    UpperTriangle([f64; N_K * (N_K - 1) / 2]),
}

/// Method used to generate the annual rate series. All percent-valued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum RateMethod {
    /// Average over the last 30 years of data.
    Default,
    /// Predictions from various firms reported by MorningStar.
    Optimistic,
    Conservative,
    /// User-selected fixed rates, in percent.
    User { values: [f64; N_K] },
    /// Historical rates starting at year `frm`; wraps modulo the selected
    /// span if the horizon exceeds it.
    Historical { frm: i32, to: Option<i32> },
    /// Constant rates equal to the mean over `[frm, to]`.
    HistoricalAverage { frm: i32, to: Option<i32> },
    /// Multivariate Gaussian fit to the historical window `[frm, to]`.
    Histochastic { frm: i32, to: Option<i32> },
    /// Multivariate Gaussian from user-supplied means and standard
    /// deviations (percent) and an optional correlation matrix.
    Stochastic {
        means: [f64; N_K],
        stdev: [f64; N_K],
        corr: Option<CorrelationSpec>,
    },
    /// Sequential per-row read from a caller-supplied table (percent),
    /// starting at row `offset`.
    Table { rows: Vec<[f64; N_K]>, offset: usize },
}

impl RateMethod {
    /// Deterministic methods never need regeneration.
    #[must_use]
    pub fn is_stochastic(&self) -> bool {
        matches!(
            self,
            RateMethod::Histochastic { .. } | RateMethod::Stochastic { .. }
        )
    }
}

/// Statistics of a historical window, in decimal.
#[derive(Debug, Clone)]
pub struct RateStatistics {
    pub means: [f64; N_K],
    pub stdev: [f64; N_K],
    pub corr: [[f64; N_K]; N_K],
    pub covar: [[f64; N_K]; N_K],
}

/// Sample mean, standard deviation (n-1), correlation and covariance of the
/// four embedded series over the inclusive year range `[frm, to]`.
pub fn rates_distributions(frm: i32, to: i32) -> Result<RateStatistics> {
    check_year_range(frm, to)?;
    let ifrm = (frm - history::FROM) as usize;
    let ito = (to - history::FROM) as usize;
    let n = (ito - ifrm + 1) as f64;

    let mut means = [0.0; N_K];
    for (k, m) in means.iter_mut().enumerate() {
        *m = history::series(k)[ifrm..=ito].iter().sum::<f64>() / n;
    }

    let mut covar = [[0.0; N_K]; N_K];
    for a in 0..N_K {
        for b in a..N_K {
            let sa = &history::series(a)[ifrm..=ito];
            let sb = &history::series(b)[ifrm..=ito];
            let mut acc = 0.0;
            for i in 0..sa.len() {
                acc += (sa[i] - means[a]) * (sb[i] - means[b]);
            }
            let c = acc / (n - 1.0);
            covar[a][b] = c;
            covar[b][a] = c;
        }
    }

    let mut stdev = [0.0; N_K];
    for k in 0..N_K {
        stdev[k] = covar[k][k].sqrt();
    }

    let mut corr = [[0.0; N_K]; N_K];
    for a in 0..N_K {
        for b in 0..N_K {
            let denom = stdev[a] * stdev[b];
            let c = if denom > 0.0 { covar[a][b] / denom } else { 0.0 };
            // Fold round-off errors back into proper bounds.
            corr[a][b] = c.clamp(-1.0, 1.0);
        }
    }

    Ok(RateStatistics {
        means,
        stdev,
        corr,
        covar,
    })
}

fn check_year_range(frm: i32, to: i32) -> Result<()> {
    if !(history::FROM..=history::TO).contains(&frm) {
        return Err(PlanError::config(format!(
            "range 'frm' {frm} out of bounds [{}, {}]",
            history::FROM,
            history::TO
        )));
    }
    if !(history::FROM..=history::TO).contains(&to) {
        return Err(PlanError::config(format!(
            "range 'to' {to} out of bounds [{}, {}]",
            history::FROM,
            history::TO
        )));
    }
    if frm >= to {
        return Err(PlanError::config(format!(
            "'frm' {frm} must be smaller than 'to' {to}"
        )));
    }
    Ok(())
}

/// Lower-triangular Cholesky factor of a symmetric positive-definite matrix.
fn cholesky(m: &[[f64; N_K]; N_K]) -> Result<[[f64; N_K]; N_K]> {
    let mut l = [[0.0; N_K]; N_K];
    for i in 0..N_K {
        for j in 0..=i {
            let mut sum = m[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 0.0 {
                    return Err(PlanError::config(
                        "covariance matrix is not positive definite",
                    ));
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }
    Ok(l)
}

fn expand_correlation(spec: &CorrelationSpec) -> Result<[[f64; N_K]; N_K]> {
    let corr = match spec {
        CorrelationSpec::Full(m) => {
            let mut c = *m;
            for k in 0..N_K {
                c[k][k] = 1.0;
            }
            for a in 0..N_K {
                for b in a + 1..N_K {
                    if (c[a][b] - c[b][a]).abs() > 1e-12 {
                        return Err(PlanError::config(
                            "correlation matrix must be symmetric",
                        ));
                    }
                }
            }
            c
        }
        CorrelationSpec::UpperTriangle(tri) => {
            let mut c = [[0.0; N_K]; N_K];
            for k in 0..N_K {
                c[k][k] = 1.0;
            }
            let mut x = 0;
            for a in 0..N_K {
                for b in a + 1..N_K {
                    c[a][b] = tri[x];
                    c[b][a] = tri[x];
                    x += 1;
                }
            }
            c
        }
    };
    Ok(corr)
}

enum Generator {
    Fixed([f64; N_K]),
    Historical { ifrm: usize, span: usize },
    Stochastic { chol: [[f64; N_K]; N_K] },
    Table { rows: Vec<[f64; N_K]>, offset: usize },
}

/// Resolved rate generator. Carries the fitted/derived distribution
/// parameters so callers can inspect them, and a per-model RNG so clones
/// used by sweep workers draw independently.
pub struct RateModel {
    method: RateMethod,
    generator: Generator,
    pub means: [f64; N_K],
    pub stdev: [f64; N_K],
    pub corr: [[f64; N_K]; N_K],
    rng: SmallRng,
}

impl RateModel {
    /// Build a generator from a method selection. `seed` drives stochastic
    /// methods only; `None` seeds from OS entropy.
    pub fn new(method: RateMethod, seed: Option<u64>) -> Result<Self> {
        let rng = match seed {
            Some(s) => SmallRng::seed_from_u64(s),
            None => SmallRng::from_os_rng(),
        };
        let mut means = [0.0; N_K];
        let mut stdev = [0.0; N_K];
        let mut corr = [[0.0; N_K]; N_K];

        let generator = match &method {
            RateMethod::Default => {
                means = DEFAULT_RATES;
                Generator::Fixed(DEFAULT_RATES)
            }
            RateMethod::Optimistic => {
                means = OPTIMISTIC_RATES;
                Generator::Fixed(OPTIMISTIC_RATES)
            }
            RateMethod::Conservative => {
                means = CONSERVATIVE_RATES;
                Generator::Fixed(CONSERVATIVE_RATES)
            }
            RateMethod::User { values } => {
                for (k, v) in values.iter().enumerate() {
                    means[k] = v / 100.0;
                }
                Generator::Fixed(means)
            }
            RateMethod::Historical { frm, to } => {
                let to = to.unwrap_or(history::TO);
                check_year_range(*frm, to)?;
                let ifrm = (frm - history::FROM) as usize;
                let span = (to - frm + 1) as usize;
                Generator::Historical { ifrm, span }
            }
            RateMethod::HistoricalAverage { frm, to } => {
                let to = to.unwrap_or(history::TO);
                let stats = rates_distributions(*frm, to)?;
                means = stats.means;
                stdev = stats.stdev;
                corr = stats.corr;
                Generator::Fixed(stats.means)
            }
            RateMethod::Histochastic { frm, to } => {
                let to = to.unwrap_or(history::TO);
                let stats = rates_distributions(*frm, to)?;
                means = stats.means;
                stdev = stats.stdev;
                corr = stats.corr;
                Generator::Stochastic {
                    chol: cholesky(&stats.covar)?,
                }
            }
            RateMethod::Stochastic {
                means: m,
                stdev: s,
                corr: c,
            } => {
                for k in 0..N_K {
                    means[k] = m[k] / 100.0;
                    stdev[k] = s[k] / 100.0;
                }
                corr = match c {
                    Some(spec) => expand_correlation(spec)?,
                    None => {
                        let mut id = [[0.0; N_K]; N_K];
                        for (k, row) in id.iter_mut().enumerate() {
                            row[k] = 1.0;
                        }
                        id
                    }
                };
                let mut covar = [[0.0; N_K]; N_K];
                for a in 0..N_K {
                    for b in 0..N_K {
                        covar[a][b] = corr[a][b] * stdev[a] * stdev[b];
                    }
                }
                Generator::Stochastic {
                    chol: cholesky(&covar)?,
                }
            }
            RateMethod::Table { rows, offset } => {
                if rows.is_empty() {
                    return Err(PlanError::config("rate table must not be empty"));
                }
                let mut dec = Vec::with_capacity(rows.len());
                for row in rows {
                    let mut r = [0.0; N_K];
                    for k in 0..N_K {
                        r[k] = row[k] / 100.0;
                    }
                    dec.push(r);
                }
                Generator::Table {
                    rows: dec,
                    offset: *offset,
                }
            }
        };

        Ok(Self {
            method,
            generator,
            means,
            stdev,
            corr,
            rng,
        })
    }

    #[must_use]
    pub fn method(&self) -> &RateMethod {
        &self.method
    }

    /// Generate an `N_K x n` series of annual rates in decimal. Historical
    /// windows shorter than `n` wrap modulo their span; table methods error
    /// when `offset + n` exceeds the available rows.
    pub fn gen_series(&mut self, n: usize) -> Result<Grid2> {
        let mut tau = Grid2::zeros(N_K, n);
        match &self.generator {
            Generator::Fixed(vals) => {
                for k in 0..N_K {
                    for y in 0..n {
                        tau.set(k, y, vals[k]);
                    }
                }
            }
            Generator::Historical { ifrm, span } => {
                for y in 0..n {
                    let idx = ifrm + (y % span);
                    for k in 0..N_K {
                        tau.set(k, y, history::series(k)[idx]);
                    }
                }
            }
            Generator::Table { rows, offset } => {
                if offset + n > rows.len() {
                    return Err(PlanError::config(format!(
                        "rate table has {} rows but needs at least {} (offset {} + {} years)",
                        rows.len(),
                        offset + n,
                        offset,
                        n
                    )));
                }
                for y in 0..n {
                    let row = rows[offset + y];
                    for k in 0..N_K {
                        tau.set(k, y, row[k]);
                    }
                }
            }
            Generator::Stochastic { chol } => {
                let chol = *chol;
                for y in 0..n {
                    let mut z = [0.0; N_K];
                    for zi in &mut z {
                        *zi = self.rng.sample(StandardNormal);
                    }
                    for k in 0..N_K {
                        let mut v = self.means[k];
                        for (j, zj) in z.iter().enumerate().take(k + 1) {
                            v += chol[k][j] * zj;
                        }
                        tau.set(k, y, v);
                    }
                }
            }
        }
        Ok(tau)
    }
}

/// Cumulative inflation multiplier at the beginning of each year.
///
/// If the series covers `N` years, the result has `N + 1` entries, since the
/// last year compounds into one extra data point at the start of the
/// following year. `gamma[0] = 1`.
#[must_use]
pub fn cumulative_inflation(tau: &Grid2) -> Vec<f64> {
    let (_, n) = tau.shape();
    let mut gamma = vec![1.0; n + 1];
    for y in 0..n {
        gamma[y + 1] = gamma[y] * (1.0 + tau.at(N_K - 1, y));
    }
    gamma
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_methods_are_constant() {
        let mut model = RateModel::new(RateMethod::Conservative, None).unwrap();
        let tau = model.gen_series(8).unwrap();
        for y in 0..8 {
            assert_eq!(tau.at(0, y), 0.06);
            assert_eq!(tau.at(3, y), 0.028);
        }
    }

    #[test]
    fn user_rates_are_percent() {
        let mut model = RateModel::new(
            RateMethod::User {
                values: [11.0, 7.0, 5.0, 2.5],
            },
            None,
        )
        .unwrap();
        let tau = model.gen_series(3).unwrap();
        assert!((tau.at(0, 0) - 0.11).abs() < 1e-12);
        assert!((tau.at(3, 2) - 0.025).abs() < 1e-12);
    }

    #[test]
    fn historical_wraps_modulo_span() {
        let mut model = RateModel::new(
            RateMethod::Historical {
                frm: 1928,
                to: Some(1930),
            },
            None,
        )
        .unwrap();
        let tau = model.gen_series(7).unwrap();
        // Span of 3 years: year 3 repeats year 0.
        assert_eq!(tau.at(0, 3), tau.at(0, 0));
        assert_eq!(tau.at(2, 5), tau.at(2, 2));
    }

    #[test]
    fn historical_average_matches_window_mean() {
        let stats = rates_distributions(1928, 2023).unwrap();
        let mut model = RateModel::new(
            RateMethod::HistoricalAverage {
                frm: 1928,
                to: Some(2023),
            },
            None,
        )
        .unwrap();
        let tau = model.gen_series(2).unwrap();
        assert!((tau.at(0, 0) - stats.means[0]).abs() < 1e-12);
        assert!((tau.at(0, 0) - tau.at(0, 1)).abs() < 1e-12);
    }

    #[test]
    fn stochastic_same_seed_same_series() {
        let method = RateMethod::Histochastic {
            frm: 1940,
            to: Some(2020),
        };
        let mut a = RateModel::new(method.clone(), Some(7)).unwrap();
        let mut b = RateModel::new(method, Some(7)).unwrap();
        let sa = a.gen_series(20).unwrap();
        let sb = b.gen_series(20).unwrap();
        assert_eq!(sa.data(), sb.data());
    }

    #[test]
    fn stochastic_different_seed_differs() {
        let method = RateMethod::Stochastic {
            means: [8.0, 5.0, 4.0, 2.5],
            stdev: [15.0, 6.0, 5.0, 2.0],
            corr: None,
        };
        let mut a = RateModel::new(method.clone(), Some(1)).unwrap();
        let mut b = RateModel::new(method, Some(2)).unwrap();
        assert_ne!(
            a.gen_series(10).unwrap().data(),
            b.gen_series(10).unwrap().data()
        );
    }

    #[test]
    fn upper_triangle_expands_symmetric() {
        let corr = expand_correlation(&CorrelationSpec::UpperTriangle([
            0.1, 0.2, 0.3, 0.4, 0.5, 0.6,
        ]))
        .unwrap();
        assert_eq!(corr[0][1], 0.1);
        assert_eq!(corr[1][0], 0.1);
        assert_eq!(corr[2][3], 0.6);
        for k in 0..N_K {
            assert_eq!(corr[k][k], 1.0);
        }
    }

    #[test]
    fn asymmetric_correlation_rejected() {
        let mut full = [[0.0; N_K]; N_K];
        for k in 0..N_K {
            full[k][k] = 1.0;
        }
        full[0][1] = 0.5;
        full[1][0] = -0.5;
        let err = RateModel::new(
            RateMethod::Stochastic {
                means: [8.0, 5.0, 4.0, 2.5],
                stdev: [15.0, 6.0, 5.0, 2.0],
                corr: Some(CorrelationSpec::Full(full)),
            },
            Some(1),
        );
        assert!(err.is_err());
    }

    #[test]
    fn table_rejects_short_input() {
        let mut model = RateModel::new(
            RateMethod::Table {
                rows: vec![[10.0, 5.0, 4.0, 2.0]; 5],
                offset: 2,
            },
            None,
        )
        .unwrap();
        assert!(model.gen_series(3).is_ok());
        assert!(model.gen_series(4).is_err());
    }

    #[test]
    fn inflation_round_trip() {
        let mut model = RateModel::new(
            RateMethod::User {
                values: [0.0, 0.0, 0.0, 3.0],
            },
            None,
        )
        .unwrap();
        let tau = model.gen_series(10).unwrap();
        let gamma = cumulative_inflation(&tau);
        assert_eq!(gamma.len(), 11);
        assert_eq!(gamma[0], 1.0);
        for g in &gamma {
            let today = 1.0 / g;
            assert!((g * today - 1.0).abs() < 1e-12);
        }
        assert!((gamma[10] - 1.03f64.powi(10)).abs() < 1e-9);
    }
}
