pub mod sim_op;
pub mod simulation;

pub use simulation::{
    GasRole, GasSensorSimulation, MixtureComponent, RunLimits, RunSummary, SimProps,
};
