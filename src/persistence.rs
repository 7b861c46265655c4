//! Saving finished simulations to disk and loading them back.
//!
//! The file is an opaque bincode blob with no schema versioning.

use crate::constants::SIMULATION_FILE_EXTENSION;
use crate::environment::{Environment, EnvironmentParams};
use crate::error::SimResult;
use crate::grid::Grid;
use crate::nanofiber::{NanoFiberGrid, NanoFiberParams};
use crate::sim::{GasSensorSimulation, RunLimits, SimProps};
use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Everything about a simulation that survives a save/load cycle.
///
/// Observers, run limits and the generator state are not persisted; a loaded
/// simulation gets a fresh generator seeded from the recorded seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub name: String,
    pub environment: EnvironmentParams,
    pub nanofiber: NanoFiberParams,
    pub state_mtx: Grid<bool>,
    pub time_mtx: Grid<f64>,
    pub iterations: u64,
    pub seed: Option<u64>,
}

impl SimulationRecord {
    pub fn from_simulation(sim: &GasSensorSimulation) -> Self {
        Self {
            name: sim.name.clone(),
            environment: sim.environment().params().clone(),
            nanofiber: sim.nanofiber().params().clone(),
            state_mtx: sim.state_mtx().clone(),
            time_mtx: sim.time_mtx().clone(),
            iterations: sim.iterations(),
            seed: sim.seed(),
        }
    }

    pub fn into_simulation(self) -> SimResult<GasSensorSimulation> {
        let props = SimProps {
            name: self.name,
            environment: Environment::new(self.environment)?,
            nanofiber: NanoFiberGrid::new(self.nanofiber)?,
            ops: vec![],
            limits: RunLimits::default(),
            seed: self.seed,
        };
        GasSensorSimulation::restore(props, self.state_mtx, self.time_mtx, self.iterations)
    }
}

/// `{year}_{month}_{day}_{hour}_{minute}.carlo` for the given moment.
pub fn simulation_file_name_at<Tz: TimeZone>(moment: &DateTime<Tz>) -> String {
    format!(
        "{}_{}_{}_{}_{}.{}",
        moment.year(),
        moment.month(),
        moment.day(),
        moment.hour(),
        moment.minute(),
        SIMULATION_FILE_EXTENSION
    )
}

pub fn default_simulation_file_name() -> String {
    simulation_file_name_at(&Local::now())
}

pub fn to_bytes(sim: &GasSensorSimulation) -> SimResult<Vec<u8>> {
    Ok(bincode::serialize(&SimulationRecord::from_simulation(sim))?)
}

pub fn from_bytes(bytes: &[u8]) -> SimResult<GasSensorSimulation> {
    let record: SimulationRecord = bincode::deserialize(bytes)?;
    record.into_simulation()
}

/// Writes `sim` to `file_path`, or to a timestamped file in the working
/// directory when no path is given. Returns the path written.
pub fn save_simulation(sim: &GasSensorSimulation, file_path: Option<&Path>) -> SimResult<PathBuf> {
    let path = match file_path {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(default_simulation_file_name()),
    };

    let mut writer = BufWriter::new(File::create(&path)?);
    bincode::serialize_into(&mut writer, &SimulationRecord::from_simulation(sim))?;
    writer.flush()?;

    log::info!("{}: saved {} iterations to {}", sim.name, sim.iterations(), path.display());
    Ok(path)
}

pub fn load_simulation<P: AsRef<Path>>(file_path: P) -> SimResult<GasSensorSimulation> {
    let reader = BufReader::new(File::open(file_path.as_ref())?);
    let record: SimulationRecord = bincode::deserialize_from(reader)?;
    log::debug!("loaded {} from {}", record.name, file_path.as_ref().display());
    record.into_simulation()
}
