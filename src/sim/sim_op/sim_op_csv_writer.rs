use crate::sim::GasSensorSimulation;
use crate::sim::sim_op::{SimOp, SimOpHandle};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// CSV Writer Operator
///
/// Writes one row per iteration with the active cell ratio and exposure time
/// statistics over all cells.
///
/// Columns:
/// - iteration
/// - active_cell_ratio
/// - simulation_time_s: latest recorded exposure time among deactivated cells
/// - min_exposure_s, avg_exposure_s, max_exposure_s: over the whole time matrix
pub struct CsvWriterOp {
    /// Path to the CSV file to write
    pub file_path: PathBuf,

    writer: Option<BufWriter<File>>,
}

impl CsvWriterOp {
    /// The file is created (or truncated) when the run starts.
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            writer: None,
        }
    }

    pub fn handle(file_path: impl Into<PathBuf>) -> SimOpHandle {
        SimOpHandle::new(Box::new(Self::new(file_path)))
    }

    fn write_header(&mut self) -> Result<(), std::io::Error> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.file_path)?;
        let mut writer = BufWriter::new(file);
        writeln!(
            writer,
            "iteration,active_cell_ratio,simulation_time_s,min_exposure_s,avg_exposure_s,max_exposure_s"
        )?;
        self.writer = Some(writer);
        Ok(())
    }

    fn write_stats(&mut self, sim: &GasSensorSimulation) -> Result<(), std::io::Error> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        let exposure = calculate_min_max_avg(sim.time_mtx().as_slice());
        writeln!(
            writer,
            "{},{},{:e},{:e},{:e},{:e}",
            sim.iterations(),
            sim.active_cell_ratio(),
            sim.simulation_time(),
            exposure.min,
            exposure.avg,
            exposure.max
        )
    }

    fn report_failure(&mut self, stage: &str, error: std::io::Error) {
        log::warn!(
            "Failed to write CSV {} to {}: {}",
            stage,
            self.file_path.display(),
            error
        );
        // stop writing after the first failure
        self.writer = None;
    }
}

impl SimOp for CsvWriterOp {
    fn name(&self) -> &str {
        "CsvWriterOp"
    }

    fn init_sim(&mut self, sim: &GasSensorSimulation) {
        if let Err(e) = self.write_header() {
            self.report_failure("header", e);
            return;
        }
        if let Err(e) = self.write_stats(sim) {
            self.report_failure("initial row", e);
        }
    }

    fn update_sim(&mut self, sim: &GasSensorSimulation) {
        if let Err(e) = self.write_stats(sim) {
            self.report_failure("row", e);
        }
    }

    fn after_sim(&mut self, _sim: &GasSensorSimulation) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                self.report_failure("flush", e);
            }
        }
    }
}

/// Statistics for a single value type (min, max, average)
#[derive(Debug, Clone, PartialEq)]
struct Stats {
    min: f64,
    max: f64,
    avg: f64,
}

fn calculate_min_max_avg(values: &[f64]) -> Stats {
    if values.is_empty() {
        return Stats { min: 0.0, max: 0.0, avg: 0.0 };
    }

    let min = values.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max = values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let sum: f64 = values.iter().sum();
    let avg = sum / values.len() as f64;

    Stats { min, max, avg }
}
