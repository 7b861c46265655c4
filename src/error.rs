//! Error types for the gas sensor simulator.

use std::fmt;
use thiserror::Error;

/// Why a run stopped before the active cell ratio fell below its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    IterationLimit,
    WallTimeLimit,
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::IterationLimit => "iteration limit reached",
            StopReason::WallTimeLimit => "wall time limit reached",
            StopReason::Cancelled => "cancelled",
        };
        f.write_str(text)
    }
}

/// Unified error type for every fallible operation in the crate.
#[derive(Error, Debug)]
pub enum SimError {
    /// Out-of-range or non-physical construction input
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Fewer active-gas molecules than carrier sites to saturate
    #[error("Active gas shortage: {active_gas_quantity:.3e} molecules for {carriers_quantity:.3e} carriers")]
    InsufficientActiveGas {
        active_gas_quantity: f64,
        carriers_quantity: f64,
    },

    /// A run limit was exhausted before convergence
    #[error("Simulation did not converge ({reason}) after {iterations} iterations, active cell ratio {active_cell_ratio:.4}")]
    DidNotConverge {
        reason: StopReason,
        iterations: u64,
        active_cell_ratio: f64,
    },

    /// The exponential current model cannot be solved from the given point
    #[error("Degenerate current fit: {0}")]
    DegenerateFit(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub fn invalid(message: impl Into<String>) -> Self {
        SimError::InvalidConfiguration(message.into())
    }
}

/// Rejects zero, negative and non-finite physical quantities.
pub(crate) fn require_positive(label: &str, value: f64) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(format!("{label} must be positive and finite, got {value}")))
    }
}
