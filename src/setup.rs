//! Experiment configuration, loadable from JSON.
//!
//! ```json
//! {
//!   "name": "h2_on_tio2",
//!   "nano_fiber_width": 2e-7,
//!   "nano_fiber_length": 1e-5,
//!   "n_x": 10,
//!   "n_y": 10,
//!   "nano_fiber_material": "TiO2 Anatase",
//!   "temperature": 298.0,
//!   "pressure": 101325.0,
//!   "container_volume": 1e-3,
//!   "concentration": 0.5,
//!   "max_distance": 1e-6,
//!   "active_gas": "H2",
//!   "passive_gas": { "name": "Air", "density": 870.5, "molar_mass": 0.02897 },
//!   "run": { "convergence_threshold": 0.8, "seed": 42 }
//! }
//! ```

use crate::constants::{
    DEFAULT_CONVERGENCE_THRESHOLD, DEFAULT_MAX_ITERATIONS, DEFAULT_PROGRESS_INTERVAL_PERCENT,
};
use crate::environment::{Environment, EnvironmentParams};
use crate::error::{SimError, SimResult};
use crate::material::{GasSpecies, MaterialType};
use crate::nanofiber::{NanoFiberGrid, NanoFiberParams};
use crate::sim::sim_op::ProgressReporterOp;
use crate::sim::{GasSensorSimulation, RunLimits, SimProps};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// A material given either by registry name or inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpeciesRef {
    Named(MaterialType),
    Custom(GasSpecies),
}

impl SpeciesRef {
    pub fn resolve(&self) -> GasSpecies {
        match self {
            SpeciesRef::Named(kind) => kind.species(),
            SpeciesRef::Custom(species) => species.clone(),
        }
    }
}

impl From<MaterialType> for SpeciesRef {
    fn from(kind: MaterialType) -> Self {
        SpeciesRef::Named(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_convergence_threshold")]
    pub convergence_threshold: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: Option<u64>,
    #[serde(default)]
    pub max_wall_time_secs: Option<f64>,
    #[serde(default = "default_progress_interval")]
    pub progress_interval_percent: f64,
}

fn default_convergence_threshold() -> f64 {
    DEFAULT_CONVERGENCE_THRESHOLD
}

fn default_max_iterations() -> Option<u64> {
    Some(DEFAULT_MAX_ITERATIONS)
}

fn default_progress_interval() -> f64 {
    DEFAULT_PROGRESS_INTERVAL_PERCENT
}

fn default_name() -> String {
    "gas_sensor".to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            convergence_threshold: default_convergence_threshold(),
            seed: None,
            max_iterations: default_max_iterations(),
            max_wall_time_secs: None,
            progress_interval_percent: default_progress_interval(),
        }
    }
}

impl RunConfig {
    pub fn limits(&self) -> SimResult<RunLimits> {
        let max_wall_time = match self.max_wall_time_secs {
            Some(secs) => Some(Duration::try_from_secs_f64(secs).map_err(|e| {
                SimError::invalid(format!("max wall time {secs} s: {e}"))
            })?),
            None => None,
        };
        Ok(RunLimits {
            max_iterations: self.max_iterations,
            max_wall_time,
            cancel: None,
        })
    }
}

/// Everything needed to build and run one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSetup {
    #[serde(default = "default_name")]
    pub name: String,
    pub nano_fiber_width: f64,
    pub nano_fiber_length: f64,
    pub n_x: usize,
    pub n_y: usize,
    pub nano_fiber_material: SpeciesRef,
    pub temperature: f64,
    pub pressure: f64,
    pub container_volume: f64,
    pub concentration: f64,
    pub max_distance: f64,
    pub active_gas: SpeciesRef,
    pub passive_gas: SpeciesRef,
    #[serde(default)]
    pub run: RunConfig,
}

impl SimulationSetup {
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(file_path: P) -> SimResult<Self> {
        let json = fs::read_to_string(file_path.as_ref())?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn environment_params(&self) -> EnvironmentParams {
        EnvironmentParams {
            temperature: self.temperature,
            pressure: self.pressure,
            container_volume: self.container_volume,
            concentration: self.concentration,
            max_distance: self.max_distance,
            active_gas: self.active_gas.resolve(),
            passive_gas: self.passive_gas.resolve(),
        }
    }

    pub fn nanofiber_params(&self) -> NanoFiberParams {
        NanoFiberParams {
            width: self.nano_fiber_width,
            length: self.nano_fiber_length,
            n_x: self.n_x,
            n_y: self.n_y,
            material: self.nano_fiber_material.resolve(),
        }
    }

    /// Engine construction inputs with a progress reporter attached.
    pub fn props(&self) -> SimResult<SimProps> {
        Ok(SimProps {
            name: self.name.clone(),
            environment: Environment::new(self.environment_params())?,
            nanofiber: NanoFiberGrid::new(self.nanofiber_params())?,
            ops: vec![ProgressReporterOp::handle(self.run.progress_interval_percent)],
            limits: self.run.limits()?,
            seed: self.run.seed,
        })
    }

    pub fn build(&self) -> SimResult<GasSensorSimulation> {
        GasSensorSimulation::new(self.props()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETUP_JSON: &str = r#"{
        "name": "json_setup",
        "nano_fiber_width": 2e-7,
        "nano_fiber_length": 1e-5,
        "n_x": 10,
        "n_y": 8,
        "nano_fiber_material": "TiO2 Anatase",
        "temperature": 298.0,
        "pressure": 101325.0,
        "container_volume": 1e-3,
        "concentration": 0.5,
        "max_distance": 1e-6,
        "active_gas": "H2",
        "passive_gas": { "name": "Dry Air", "density": 870.5, "molar_mass": 0.02897 },
        "run": { "convergence_threshold": 0.7, "seed": 42 }
    }"#;

    #[test]
    fn test_parse_named_and_inline_species() {
        let setup = SimulationSetup::from_json_str(SETUP_JSON).unwrap();

        assert_eq!(setup.nano_fiber_material, SpeciesRef::Named(MaterialType::TiO2Anatase));
        assert_eq!(setup.active_gas.resolve(), MaterialType::H2.species());
        assert_eq!(
            setup.passive_gas.resolve(),
            GasSpecies::new("Dry Air", 870.5, 0.02897)
        );
        assert_eq!(setup.run.convergence_threshold, 0.7);
        assert_eq!(setup.run.seed, Some(42));
        // omitted fields fall back to defaults
        assert_eq!(setup.run.max_iterations, Some(DEFAULT_MAX_ITERATIONS));
        assert_eq!(setup.run.progress_interval_percent, DEFAULT_PROGRESS_INTERVAL_PERCENT);
    }

    #[test]
    fn test_build_simulation() {
        let setup = SimulationSetup::from_json_str(SETUP_JSON).unwrap();
        let sim = setup.build().unwrap();

        assert_eq!(sim.name, "json_setup");
        assert_eq!(sim.nanofiber().grid_size(), (8, 10));
        assert_eq!(sim.seed(), Some(42));
        assert_eq!(sim.limits().max_iterations, Some(DEFAULT_MAX_ITERATIONS));
    }

    #[test]
    fn test_unknown_material_name_fails() {
        let json = SETUP_JSON.replace("\"H2\"", "\"Unobtainium\"");
        assert!(matches!(
            SimulationSetup::from_json_str(&json),
            Err(SimError::Json(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let setup = SimulationSetup::from_json_str(SETUP_JSON).unwrap();
        let json = setup.to_json_string().unwrap();
        assert_eq!(SimulationSetup::from_json_str(&json).unwrap(), setup);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("gas_sensor_setup_{}.json", std::process::id()));
        fs::write(&path, SETUP_JSON).unwrap();
        let setup = SimulationSetup::from_json_file(&path);
        fs::remove_file(&path).ok();

        assert_eq!(setup.unwrap(), SimulationSetup::from_json_str(SETUP_JSON).unwrap());
        assert!(matches!(
            SimulationSetup::from_json_file(std::env::temp_dir().join("gas_sensor_missing_setup.json")),
            Err(SimError::Io(_))
        ));
    }

    #[test]
    fn test_oversized_grid_is_a_configuration_error() {
        let json = SETUP_JSON
            .replace("\"n_x\": 10", "\"n_x\": 8589934592")
            .replace("\"n_y\": 8", "\"n_y\": 8589934592");
        let setup = SimulationSetup::from_json_str(&json).unwrap();
        assert!(matches!(setup.build(), Err(SimError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_invalid_wall_time() {
        let run = RunConfig {
            max_wall_time_secs: Some(-1.0),
            ..RunConfig::default()
        };
        assert!(run.limits().is_err());
    }
}
