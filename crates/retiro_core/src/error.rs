use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlanError>;

/// Errors surfaced by plan configuration, optimization, and sweeps.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Bad input: wrong shapes, out-of-range values, unparseable dates,
    /// unsupported demographic combinations. Raised at the point of encoding.
    #[error("configuration error: {0}")]
    Config(String),

    /// The solver did not return an optimal solution (infeasible, unbounded,
    /// or an internal solver failure). Result arrays are not materialized.
    #[error("optimization unsuccessful: {0}")]
    Unsuccessful(String),

    /// A cooperative cancellation was requested between iterations or
    /// between sweep scenarios.
    #[error("solve cancelled")]
    Cancelled,

    /// A method was called before the plan was fully configured.
    #[error("plan not ready: {0}")]
    NotReady(String),
}

impl PlanError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        PlanError::Config(msg.into())
    }
}
