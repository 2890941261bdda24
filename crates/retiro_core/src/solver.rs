//! MILP solver dispatch.
//!
//! Backends implement a single capability: submit a complete model, get
//! back the objective value, the primal vector, and a status. Each
//! self-consistent iteration solves from scratch; no warm starts.

use serde::{Deserialize, Serialize};

use crate::lp::{BoundKind, LpModel};

/// Outcome of one solver invocation.
#[derive(Debug, Clone)]
pub struct Solution {
    pub objective: f64,
    pub x: Vec<f64>,
    pub optimal: bool,
    pub message: String,
}

impl Solution {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            objective: f64::NAN,
            x: Vec::new(),
            optimal: false,
            message: message.into(),
        }
    }
}

/// Capability set a backend must provide.
pub trait MilpSolver {
    fn solve(&self, model: &LpModel) -> Solution;
}

/// Backend selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SolverBackend {
    /// Pure-Rust dual simplex with branch-and-bound.
    #[default]
    MicroLp,
}

impl SolverBackend {
    #[must_use]
    pub fn instance(self) -> Box<dyn MilpSolver + Send + Sync> {
        match self {
            SolverBackend::MicroLp => Box::new(MicroLpSolver),
        }
    }
}

/// Backend built on the `microlp` crate.
pub struct MicroLpSolver;

impl MilpSolver for MicroLpSolver {
    fn solve(&self, model: &LpModel) -> Solution {
        use microlp::{ComparisonOp, OptimizationDirection, Problem};

        let nvars = model.nvars();
        let mut problem = Problem::new(OptimizationDirection::Minimize);

        let mut vars = Vec::with_capacity(nvars);
        for i in 0..nvars {
            let (lb, ub) = (model.bounds.lb[i], model.bounds.ub[i]);
            let var = if model.bounds.integer[i] {
                problem.add_integer_var(model.objective[i], (lb as i32, ub as i32))
            } else {
                problem.add_var(model.objective[i], (lb, ub))
            };
            vars.push(var);
        }

        for (r, row) in model.matrix.rows.iter().enumerate() {
            let expr: Vec<(microlp::Variable, f64)> = row
                .ind
                .iter()
                .zip(&row.val)
                .map(|(&i, &v)| (vars[i], v))
                .collect();
            let (lb, ub) = (model.matrix.lb[r], model.matrix.ub[r]);
            match model.matrix.row_kind(r) {
                BoundKind::Fixed => {
                    problem.add_constraint(expr.as_slice(), ComparisonOp::Eq, ub);
                }
                BoundKind::Lower => {
                    problem.add_constraint(expr.as_slice(), ComparisonOp::Ge, lb);
                }
                BoundKind::Upper => {
                    problem.add_constraint(expr.as_slice(), ComparisonOp::Le, ub);
                }
                BoundKind::Range => {
                    problem.add_constraint(expr.as_slice(), ComparisonOp::Ge, lb);
                    problem.add_constraint(expr.as_slice(), ComparisonOp::Le, ub);
                }
                BoundKind::Free => {}
            }
        }

        match problem.solve() {
            Ok(solution) => {
                let x: Vec<f64> = vars.iter().map(|&v| solution[v]).collect();
                Solution {
                    objective: solution.objective(),
                    x,
                    optimal: true,
                    message: "optimal".to_string(),
                }
            }
            Err(e) => Solution::failed(e.to_string()),
        }
    }
}
