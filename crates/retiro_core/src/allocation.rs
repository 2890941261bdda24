//! Asset-allocation glide paths.
//!
//! Per-individual, per-account, per-asset allocation ratios are interpolated
//! between an initial and a final percent vector over each individual's
//! horizon (inclusive of the terminal slice). Interpolation is either linear
//! or an s-curve built from a hyperbolic tangent whose endpoints are matched
//! exactly by solving a 2x2 linear system.

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::grid::Grid4;
use crate::rates::N_K;

/// Number of account types: taxable, tax-deferred, tax-free.
pub const N_J: usize = 3;

/// Interpolation method for glide paths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum InterpMethod {
    Linear,
    /// Smooth transition centered at `center` years with a transition
    /// half-width of `width` years.
    SCurve { center: f64, width: f64 },
}

impl Default for InterpMethod {
    fn default() -> Self {
        InterpMethod::Linear
    }
}

/// Initial and final percent vectors over the four asset classes.
pub type GlidePair = [[f64; N_K]; 2];

/// Allocation coordination across accounts and spouses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "coordination", rename_all = "camelCase")]
pub enum AllocationSpec {
    /// One glide pair per individual and account type.
    PerAccount {
        taxable: Vec<GlidePair>,
        tax_deferred: Vec<GlidePair>,
        tax_free: Vec<GlidePair>,
    },
    /// One glide pair per individual, shared across account types.
    PerIndividual { generic: Vec<GlidePair> },
    /// A single glide pair coordinated across accounts and spouses.
    Coordinated { generic: GlidePair },
}

fn lerp(a: f64, b: f64, num_points: usize) -> Vec<f64> {
    debug_assert!(num_points >= 2);
    let step = (b - a) / (num_points - 1) as f64;
    (0..num_points).map(|k| a + step * k as f64).collect()
}

/// S-curve interpolation matching `a` at the first point and `b` at the
/// last. The width carries a small floor to avoid division by zero.
fn tanh_interp(a: f64, b: f64, num_points: usize, center: f64, width: f64) -> Vec<f64> {
    debug_assert!(num_points >= 2);
    let n = num_points as f64;
    let w = width + 1e-4;
    let t = |k: usize| n * k as f64 / (n - 1.0);

    // Solve the 2x2 system so the curve hits both endpoints exactly.
    let th0 = ((t(0) - center) / w).tanh();
    let thn = ((t(num_points - 1) - center) / w).tanh();
    let k11 = 0.5 - 0.5 * th0;
    let k21 = 0.5 - 0.5 * thn;
    let k12 = 0.5 + 0.5 * th0;
    let k22 = 0.5 + 0.5 * thn;
    let bb = (b - (k21 / k11) * a) / (k22 - (k21 / k11) * k12);
    let aa = (a - k12 * bb) / k11;

    (0..num_points)
        .map(|k| aa + 0.5 * (bb - aa) * (1.0 + ((t(k) - center) / w).tanh()))
        .collect()
}

fn interpolate(method: InterpMethod, a: f64, b: f64, num_points: usize) -> Vec<f64> {
    match method {
        InterpMethod::Linear => lerp(a, b, num_points),
        InterpMethod::SCurve { center, width } => tanh_interp(a, b, num_points, center, width),
    }
}

fn check_pair(pair: &GlidePair, what: &str) -> Result<()> {
    for side in pair {
        let sum: f64 = side.iter().sum();
        if (sum - 100.0).abs() > 0.01 {
            return Err(PlanError::config(format!(
                "{what}: sum of allocation percentages must add to 100, got {sum}"
            )));
        }
    }
    Ok(())
}

/// Build the `(N_i, N_J, N_K, N_n + 1)` allocation grid. Entries beyond an
/// individual's horizon are left at zero.
pub fn build_allocations(
    spec: &AllocationSpec,
    method: InterpMethod,
    horizons: &[usize],
    n_n: usize,
) -> Result<Grid4> {
    let n_i = horizons.len();
    let mut alpha = Grid4::zeros(n_i, N_J, N_K, n_n + 1);

    let mut fill = |i: usize, j: usize, pair: &GlidePair| {
        let nin = horizons[i] + 1;
        for k in 0..N_K {
            let dat = interpolate(method, pair[0][k] / 100.0, pair[1][k] / 100.0, nin);
            for (n, v) in dat.iter().enumerate() {
                alpha.set(i, j, k, n, *v);
            }
        }
    };

    match spec {
        AllocationSpec::PerAccount {
            taxable,
            tax_deferred,
            tax_free,
        } => {
            for (what, item) in [
                ("taxable", taxable),
                ("tax-deferred", tax_deferred),
                ("tax-free", tax_free),
            ] {
                if item.len() != n_i {
                    return Err(PlanError::config(format!(
                        "{what}: must have one glide pair per individual"
                    )));
                }
                for pair in item {
                    check_pair(pair, what)?;
                }
            }
            for i in 0..n_i {
                fill(i, 0, &taxable[i]);
                fill(i, 1, &tax_deferred[i]);
                fill(i, 2, &tax_free[i]);
            }
        }
        AllocationSpec::PerIndividual { generic } => {
            if generic.len() != n_i {
                return Err(PlanError::config(
                    "generic: must have one glide pair per individual",
                ));
            }
            for pair in generic {
                check_pair(pair, "generic")?;
            }
            for i in 0..n_i {
                for j in 0..N_J {
                    fill(i, j, &generic[i]);
                }
            }
        }
        AllocationSpec::Coordinated { generic } => {
            check_pair(generic, "generic")?;
            for i in 0..n_i {
                for j in 0..N_J {
                    fill(i, j, generic);
                }
            }
        }
    }

    Ok(alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIXTY_FORTY: GlidePair = [[60.0, 20.0, 10.0, 10.0], [40.0, 30.0, 20.0, 10.0]];

    #[test]
    fn linear_hits_endpoints() {
        let dat = lerp(0.6, 0.4, 11);
        assert!((dat[0] - 0.6).abs() < 1e-12);
        assert!((dat[10] - 0.4).abs() < 1e-12);
        assert!((dat[5] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn tanh_hits_endpoints_exactly() {
        let dat = tanh_interp(0.6, 0.4, 21, 15.0, 5.0);
        assert!((dat[0] - 0.6).abs() < 1e-9);
        assert!((dat[20] - 0.4).abs() < 1e-9);
    }

    #[test]
    fn tanh_zero_width_is_floored() {
        let dat = tanh_interp(1.0, 0.0, 11, 5.0, 0.0);
        assert!(dat.iter().all(|v| v.is_finite()));
        assert!((dat[0] - 1.0).abs() < 1e-9);
        assert!((dat[10] - 0.0).abs() < 1e-9);
    }

    #[test]
    fn allocations_sum_to_one_within_horizon() {
        for method in [
            InterpMethod::Linear,
            InterpMethod::SCurve {
                center: 10.0,
                width: 4.0,
            },
        ] {
            let alpha = build_allocations(
                &AllocationSpec::Coordinated {
                    generic: SIXTY_FORTY,
                },
                method,
                &[20, 15],
                20,
            )
            .unwrap();
            for i in 0..2 {
                for j in 0..N_J {
                    for n in 0..=[20, 15][i] {
                        let sum: f64 = (0..N_K).map(|k| alpha.at(i, j, k, n)).sum();
                        assert!(
                            (sum - 1.0).abs() < 1e-6,
                            "sum {sum} at i={i} j={j} n={n}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn per_account_requires_one_pair_per_individual() {
        let spec = AllocationSpec::PerAccount {
            taxable: vec![SIXTY_FORTY],
            tax_deferred: vec![SIXTY_FORTY],
            tax_free: vec![SIXTY_FORTY],
        };
        assert!(build_allocations(&spec, InterpMethod::Linear, &[10, 10], 10).is_err());
    }

    #[test]
    fn bad_percent_sum_rejected() {
        let bad: GlidePair = [[50.0, 20.0, 10.0, 10.0], [40.0, 30.0, 20.0, 10.0]];
        let spec = AllocationSpec::Coordinated { generic: bad };
        assert!(build_allocations(&spec, InterpMethod::Linear, &[10], 10).is_err());
    }
}
