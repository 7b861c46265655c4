pub mod constants;
pub mod environment;
pub mod error;
pub mod grid;
pub mod material;
pub mod nanofiber;
pub mod persistence;
pub mod postprocess;
pub mod report;
pub mod setup;
pub mod sim;
pub mod velocity_distribution;

pub use error::{SimError, SimResult, StopReason};
pub use sim::{GasSensorSimulation, RunLimits, SimProps};
