//! Historical-range and Monte Carlo sweeps.
//!
//! A sweep clones the plan for each scenario, re-draws the rate series,
//! solves, and collects the (partial bequest, objective) distribution.
//! Scenarios that fail to solve are counted but excluded from the
//! distribution. Workers fan out with rayon when the `parallel` feature is
//! enabled; the only shared state is the progress aggregator.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::{PlanError, Result};
use crate::history;
use crate::plan::{Objective, Plan, SolveOptions};
use crate::rates::RateMethod;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Progress tracking for sweeps: completed/total counters, a cancellation
/// flag, and an optional fraction callback.
#[derive(Clone, Default)]
pub struct SweepProgress {
    completed: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
    on_progress: Option<ProgressCallback>,
}

impl SweepProgress {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            completed: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(total)),
            cancelled: Arc::new(AtomicBool::new(false)),
            on_progress: None,
        }
    }

    /// Attach a callback invoked with the completed fraction (0..1) after
    /// every scenario.
    #[must_use]
    pub fn with_callback(total: usize, callback: impl Fn(f64) + Send + Sync + 'static) -> Self {
        let mut progress = Self::new(total);
        progress.on_progress = Some(Arc::new(callback));
        progress
    }

    pub fn reset(&self, total: usize) {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Completed fraction in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.completed() as f64 / total as f64
    }

    pub fn increment(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if let Some(cb) = &self.on_progress {
            cb(self.fraction());
        }
    }

    /// Request cancellation; honored between scenarios.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for SweepProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepProgress")
            .field("completed", &self.completed())
            .field("total", &self.total())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// One solved scenario.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioOutcome {
    /// Non-spousal bequest at the first passing, today's dollars.
    pub partial_bequest: f64,
    /// Spending basis or final bequest, depending on the objective.
    pub objective_value: f64,
}

/// Distribution of outcomes over a sweep.
#[derive(Debug, Clone)]
pub struct SweepResult {
    pub objective: Objective,
    /// Scenarios attempted, including infeasible ones.
    pub attempted: usize,
    /// Outcomes of the scenarios that solved.
    pub outcomes: Vec<ScenarioOutcome>,
    /// True when the sweep stopped early on cancellation.
    pub cancelled: bool,
}

impl SweepResult {
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            return 0.0;
        }
        self.outcomes.len() as f64 / self.attempted as f64
    }

    fn values(&self) -> Vec<f64> {
        self.outcomes.iter().map(|o| o.objective_value).collect()
    }

    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        let vals = self.values();
        if vals.is_empty() {
            return None;
        }
        Some(vals.iter().sum::<f64>() / vals.len() as f64)
    }

    #[must_use]
    pub fn median(&self) -> Option<f64> {
        let mut vals = self.values();
        if vals.is_empty() {
            return None;
        }
        vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = vals.len() / 2;
        Some(if vals.len() % 2 == 0 {
            (vals[mid - 1] + vals[mid]) / 2.0
        } else {
            vals[mid]
        })
    }

    /// `(min, max)` of the objective distribution.
    #[must_use]
    pub fn range(&self) -> Option<(f64, f64)> {
        let vals = self.values();
        if vals.is_empty() {
            return None;
        }
        let min = vals.iter().copied().fold(f64::INFINITY, f64::min);
        let max = vals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some((min, max))
    }
}

enum ScenarioDraw {
    HistoricalStart(i32),
    FreshStochastic,
}

fn run_scenario(
    plan: &Plan,
    objective: Objective,
    options: &SolveOptions,
    draw: &ScenarioDraw,
) -> Option<ScenarioOutcome> {
    let mut clone = plan.clone();
    let setup = match draw {
        ScenarioDraw::HistoricalStart(year) => clone.set_rates(RateMethod::Historical {
            frm: *year,
            to: None,
        }),
        // Always a fresh draw, regardless of the reproducibility flag.
        ScenarioDraw::FreshStochastic => clone.regen_rates(true),
    };
    if let Err(e) = setup {
        log::warn!("scenario setup failed: {e}");
        return None;
    }
    match clone.solve(objective, options) {
        Ok(solved) => Some(ScenarioOutcome {
            partial_bequest: solved.partial_bequest,
            objective_value: solved.objective_result(),
        }),
        Err(PlanError::Unsuccessful(msg)) => {
            log::debug!("scenario infeasible: {msg}");
            None
        }
        Err(e) => {
            log::warn!("scenario failed: {e}");
            None
        }
    }
}

fn run_sweep(
    plan: &Plan,
    objective: Objective,
    options: &SolveOptions,
    draws: Vec<ScenarioDraw>,
    progress: Option<&SweepProgress>,
) -> SweepResult {
    let attempted = draws.len();
    if let Some(p) = progress {
        p.reset(attempted);
    }

    let run_one = |draw: &ScenarioDraw| -> Option<ScenarioOutcome> {
        if progress.is_some_and(SweepProgress::is_cancelled) {
            return None;
        }
        let outcome = run_scenario(plan, objective, options, draw);
        if let Some(p) = progress {
            p.increment();
        }
        outcome
    };

    #[cfg(feature = "parallel")]
    let results: Vec<Option<ScenarioOutcome>> = draws.par_iter().map(run_one).collect();
    #[cfg(not(feature = "parallel"))]
    let results: Vec<Option<ScenarioOutcome>> = draws.iter().map(run_one).collect();

    SweepResult {
        objective,
        attempted,
        outcomes: results.into_iter().flatten().collect(),
        cancelled: progress.is_some_and(SweepProgress::is_cancelled),
    }
}

/// Solve the plan over a sliding window of historical starting years
/// `[ystart, yend]` (inclusive).
pub fn run_historical_range(
    plan: &Plan,
    objective: Objective,
    options: &SolveOptions,
    ystart: i32,
    yend: i32,
    progress: Option<&SweepProgress>,
) -> Result<SweepResult> {
    let mut yend = yend;
    if yend > history::TO {
        yend = history::TO;
        log::warn!("upper bound for year range re-adjusted to {yend}");
    }
    if ystart < history::FROM {
        return Err(PlanError::config(format!(
            "starting year {ystart} precedes available data ({})",
            history::FROM
        )));
    }
    if yend < ystart {
        return Err(PlanError::config(format!(
            "empty historical range {ystart}..{yend}"
        )));
    }

    log::info!("running historical range from {ystart} to {yend}");
    let draws: Vec<ScenarioDraw> = (ystart..=yend).map(ScenarioDraw::HistoricalStart).collect();
    Ok(run_sweep(plan, objective, options, draws, progress))
}

/// Run `n` Monte Carlo scenarios with independent stochastic rate draws.
pub fn run_monte_carlo(
    plan: &Plan,
    objective: Objective,
    options: &SolveOptions,
    n: usize,
    progress: Option<&SweepProgress>,
) -> Result<SweepResult> {
    match plan.rate_method() {
        Some(method) if method.is_stochastic() => {}
        _ => {
            return Err(PlanError::config(
                "Monte Carlo simulations require a stochastic rate method",
            ));
        }
    }

    log::info!("running {n} Monte Carlo simulations");
    let draws: Vec<ScenarioDraw> = (0..n).map(|_| ScenarioDraw::FreshStochastic).collect();
    Ok(run_sweep(plan, objective, options, draws, progress))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_fraction_and_cancel() {
        let p = SweepProgress::new(4);
        assert_eq!(p.fraction(), 0.0);
        p.increment();
        p.increment();
        assert!((p.fraction() - 0.5).abs() < 1e-12);
        assert!(!p.is_cancelled());
        p.cancel();
        assert!(p.is_cancelled());
    }

    #[test]
    fn progress_callback_fires() {
        use std::sync::Mutex;
        let seen: Arc<Mutex<Vec<f64>>> = Arc::default();
        let inner = seen.clone();
        let p = SweepProgress::with_callback(2, move |f| inner.lock().unwrap().push(f));
        p.increment();
        p.increment();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!((seen[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn summary_statistics() {
        let result = SweepResult {
            objective: Objective::MaxSpending,
            attempted: 4,
            outcomes: vec![
                ScenarioOutcome {
                    partial_bequest: 0.0,
                    objective_value: 10.0,
                },
                ScenarioOutcome {
                    partial_bequest: 0.0,
                    objective_value: 30.0,
                },
                ScenarioOutcome {
                    partial_bequest: 0.0,
                    objective_value: 20.0,
                },
            ],
            cancelled: false,
        };
        assert!((result.success_rate() - 0.75).abs() < 1e-12);
        assert_eq!(result.mean(), Some(20.0));
        assert_eq!(result.median(), Some(20.0));
        assert_eq!(result.range(), Some((10.0, 30.0)));
    }

    #[test]
    fn empty_distribution_has_no_stats() {
        let result = SweepResult {
            objective: Objective::MaxBequest,
            attempted: 2,
            outcomes: vec![],
            cancelled: false,
        };
        assert_eq!(result.mean(), None);
        assert_eq!(result.median(), None);
        assert_eq!(result.range(), None);
    }
}
