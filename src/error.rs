// error.rs - Failure modes of a simulation run

use thiserror::Error;

/// Everything that can go wrong between configuring a run and reading
/// its thermodynamic results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Rejected before any lattice is allocated.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A density-of-states entry, bucket index or weighted sum left the
    /// representable range.
    #[error("numerical failure: {0}")]
    Numerical(String),

    /// The Wang-Landau step cap ran out before |f - 1| <= tol.
    #[error("Wang-Landau did not converge within {steps} steps (modification factor {factor})")]
    NotConverged { steps: u64, factor: f64 },

    /// An operation was requested in a state that cannot serve it.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

pub type Result<T> = std::result::Result<T, SimError>;
