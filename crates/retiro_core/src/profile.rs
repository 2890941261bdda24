//! Spending-profile time series.
//!
//! The profile is a unitless shape multiplying the net-spending basis. The
//! survivor fraction scales it down after the first passing in a two-spouse
//! plan. The smile variant adds a cosine dip and a gentle linear drift and
//! is renormalized to be sum-neutral against the flat profile.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{PlanError, Result};

/// Profile shape selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum ProfileShape {
    Flat,
    /// Cosine dip of `dip` percent, linear increase of `increase` percent
    /// over the horizon, held flat for the first `delay` years.
    Smile {
        dip: f64,
        increase: f64,
        delay: usize,
    },
}

/// Generate the spending profile, unadjusted for inflation.
///
/// `fraction` is the survivor fraction applied from `n_d` on.
pub fn gen_xi(
    shape: ProfileShape,
    fraction: f64,
    n_d: usize,
    n_n: usize,
) -> Result<Vec<f64>> {
    let mut xi = vec![1.0; n_n];
    match shape {
        ProfileShape::Flat => {
            if n_d < n_n {
                for v in &mut xi[n_d..] {
                    *v *= fraction;
                }
            }
        }
        ProfileShape::Smile {
            dip,
            increase,
            delay,
        } => {
            if n_n < 2 || delay > n_n - 2 {
                return Err(PlanError::config(format!(
                    "smile delay {delay} outside year range"
                )));
            }
            let c = delay;
            let span = (n_n - 1 - c) as f64;
            let a = dip / 100.0;
            let b = increase / 100.0;
            for (t, v) in xi[c..].iter_mut().enumerate() {
                let x = t as f64;
                *v += a * (2.0 * PI * x / span).cos() + b / (n_n - 1) as f64 * x;
            }
            let head = xi[c];
            for v in &mut xi[..c] {
                *v = head;
            }
            // Normalize to be sum-neutral with respect to a flat profile,
            // accounting for the flat spousal reduction.
            let mut neutral = n_n as f64;
            if n_d < n_n {
                neutral -= (1.0 - fraction) * (n_n - n_d) as f64;
                for v in &mut xi[n_d..] {
                    *v *= fraction;
                }
            }
            let sum: f64 = xi.iter().sum();
            for v in &mut xi {
                *v *= neutral / sum;
            }
        }
    }
    Ok(xi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_single_is_ones() {
        let xi = gen_xi(ProfileShape::Flat, 0.6, 10, 10).unwrap();
        assert!(xi.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn flat_survivor_scaling() {
        let xi = gen_xi(ProfileShape::Flat, 0.6, 7, 10).unwrap();
        assert_eq!(xi[6], 1.0);
        assert!((xi[7] - 0.6).abs() < 1e-12);
        assert!((xi[9] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn smile_is_sum_neutral() {
        let shape = ProfileShape::Smile {
            dip: 15.0,
            increase: 12.0,
            delay: 0,
        };
        let n_n = 30;
        let xi = gen_xi(shape, 1.0, n_n, n_n).unwrap();
        let sum: f64 = xi.iter().sum();
        assert!((sum - n_n as f64).abs() < 1e-9);
    }

    #[test]
    fn smile_with_survivor_matches_flat_equivalent_sum() {
        let shape = ProfileShape::Smile {
            dip: 15.0,
            increase: 12.0,
            delay: 0,
        };
        let (n_n, n_d, chi) = (20, 12, 0.6);
        let xi = gen_xi(shape, chi, n_d, n_n).unwrap();
        let sum: f64 = xi.iter().sum();
        let neutral = n_n as f64 - (1.0 - chi) * (n_n - n_d) as f64;
        assert!((sum - neutral).abs() < 1e-9);
    }

    #[test]
    fn smile_delay_holds_head_flat() {
        let shape = ProfileShape::Smile {
            dip: 15.0,
            increase: 12.0,
            delay: 4,
        };
        let xi = gen_xi(shape, 1.0, 20, 20).unwrap();
        for t in 0..4 {
            assert!((xi[t] - xi[4]).abs() < 1e-12);
        }
    }

    #[test]
    fn smile_delay_out_of_range_rejected() {
        let shape = ProfileShape::Smile {
            dip: 15.0,
            increase: 12.0,
            delay: 9,
        };
        assert!(gen_xi(shape, 1.0, 10, 10).is_err());
    }

    #[test]
    fn profile_is_nonnegative() {
        let shape = ProfileShape::Smile {
            dip: 15.0,
            increase: 12.0,
            delay: 0,
        };
        let xi = gen_xi(shape, 0.6, 18, 30).unwrap();
        assert!(xi.iter().all(|&v| v >= 0.0));
    }
}
