mod sim_op_csv_writer;
mod sim_op_progress_reporter;

pub use sim_op_csv_writer::CsvWriterOp;
pub use sim_op_progress_reporter::{ProgressReporterOp, progress_percent};

use crate::sim::GasSensorSimulation;

/// Observer hooks around [`GasSensorSimulation::run`].
///
/// Ops see the engine read-only; they report on a run but cannot steer it.
pub trait SimOp {
    /// The name of this operator (for identification and lookup)
    fn name(&self) -> &str;

    /// Called once before the first iteration of a run
    fn init_sim(&mut self, _sim: &GasSensorSimulation) {}

    /// Called after every iteration
    fn update_sim(&mut self, _sim: &GasSensorSimulation) {}

    /// Called once when the run stops, converged or not
    fn after_sim(&mut self, _sim: &GasSensorSimulation) {}
}

pub struct SimOpHandle {
    pub op: Box<dyn SimOp>,
}

impl SimOpHandle {
    /// Create a new SimOpHandle with the given operation
    pub fn new(op: Box<dyn SimOp>) -> Self {
        SimOpHandle { op }
    }
}
