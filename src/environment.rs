//! Gas container conditions and the molecule counts derived from them.

use crate::constants::{AVOGADRO, GAS_CONSTANT};
use crate::error::{SimError, SimResult, require_positive};
use crate::material::GasSpecies;
use crate::report::{Report, Summary};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentParams {
    pub temperature: f64,      // K
    pub pressure: f64,         // Pa
    pub container_volume: f64, // m³
    /// Fraction of active gas in the mixture, 0..=1
    pub concentration: f64,
    /// Longest distance (m) a molecule travels before reaching a cell
    pub max_distance: f64,
    pub active_gas: GasSpecies,
    pub passive_gas: GasSpecies,
}

/// Validated, immutable container configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    params: EnvironmentParams,
    active_gas_diameter: f64,
    passive_gas_diameter: f64,
    passive_gas_quantity: f64,
    active_gas_quantity: f64,
}

/// Ideal gas law molecule count, `N_A·P·V / (R·T)`.
pub fn passive_gas_quantity(pressure: f64, temperature: f64, volume: f64) -> f64 {
    let num = AVOGADRO * pressure * volume;
    let den = GAS_CONSTANT * temperature;
    num / den
}

impl Environment {
    pub fn new(params: EnvironmentParams) -> SimResult<Self> {
        require_positive("temperature", params.temperature)?;
        require_positive("pressure", params.pressure)?;
        require_positive("container volume", params.container_volume)?;
        require_positive("max distance", params.max_distance)?;
        if !(0.0..=1.0).contains(&params.concentration) {
            return Err(SimError::invalid(format!(
                "concentration must lie in [0, 1], got {}",
                params.concentration
            )));
        }
        params.active_gas.validate()?;
        params.passive_gas.validate()?;

        let passive_gas_quantity =
            passive_gas_quantity(params.pressure, params.temperature, params.container_volume);

        Ok(Self {
            active_gas_diameter: params.active_gas.molecular_diameter(),
            passive_gas_diameter: params.passive_gas.molecular_diameter(),
            active_gas_quantity: passive_gas_quantity * params.concentration,
            passive_gas_quantity,
            params,
        })
    }

    pub fn params(&self) -> &EnvironmentParams {
        &self.params
    }

    pub fn temperature(&self) -> f64 {
        self.params.temperature
    }

    pub fn pressure(&self) -> f64 {
        self.params.pressure
    }

    pub fn container_volume(&self) -> f64 {
        self.params.container_volume
    }

    pub fn concentration(&self) -> f64 {
        self.params.concentration
    }

    pub fn max_distance(&self) -> f64 {
        self.params.max_distance
    }

    pub fn active_gas(&self) -> &GasSpecies {
        &self.params.active_gas
    }

    pub fn passive_gas(&self) -> &GasSpecies {
        &self.params.passive_gas
    }

    pub fn active_gas_diameter(&self) -> f64 {
        self.active_gas_diameter
    }

    pub fn passive_gas_diameter(&self) -> f64 {
        self.passive_gas_diameter
    }

    pub fn active_gas_quantity(&self) -> f64 {
        self.active_gas_quantity
    }

    pub fn passive_gas_quantity(&self) -> f64 {
        self.passive_gas_quantity
    }
}

impl Summary for Environment {
    fn summary(&self) -> Report {
        Report::new("Environment")
            .row("Active Gas", self.active_gas().name.as_str())
            .row("Passive Gas", self.passive_gas().name.as_str())
            .row("Active Gas Concentration", self.concentration())
            .row("Container Pressure [Pa]", self.pressure())
            .row("Container Temperature [K]", self.temperature())
            .row("Container Volume [m^3]", self.container_volume())
            .row("Max Distance [m]", self.max_distance())
            .row("Active Gas Diameter [m]", self.active_gas_diameter)
            .row("Passive Gas Diameter [m]", self.passive_gas_diameter)
            .row("Active Gas Quantity", self.active_gas_quantity)
            .row("Passive Gas Quantity", self.passive_gas_quantity)
    }
}
