//! Sensor geometry and carrier counts.

use crate::error::{SimError, SimResult, require_positive};
use crate::material::GasSpecies;
use crate::report::{Report, Summary};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NanoFiberParams {
    pub width: f64,  // m
    pub length: f64, // m
    pub n_x: usize,
    pub n_y: usize,
    pub material: GasSpecies,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NanoFiberGrid {
    params: NanoFiberParams,
    surface_carrier_density: f64,
    total_cells: usize,
    cell_carriers: u64,
    carriers_quantity: f64,
}

/// Carriers per m², one per projected molecule disc of the sensing material.
pub fn surface_carrier_density(material: &GasSpecies) -> f64 {
    let diameter = material.molecular_diameter();
    let area = PI * diameter.powi(2) / 4.0;
    1.0 / area
}

impl NanoFiberGrid {
    pub fn new(params: NanoFiberParams) -> SimResult<Self> {
        require_positive("nanofiber width", params.width)?;
        require_positive("nanofiber length", params.length)?;
        if params.n_x == 0 || params.n_y == 0 {
            return Err(SimError::invalid(format!(
                "grid dimensions must be at least 1x1, got {}x{}",
                params.n_x, params.n_y
            )));
        }
        let total_cells = params.n_x.checked_mul(params.n_y).ok_or_else(|| {
            SimError::invalid(format!(
                "grid of {}x{} cells is too large",
                params.n_x, params.n_y
            ))
        })?;
        params.material.validate()?;

        let surface_carrier_density = surface_carrier_density(&params.material);
        let area = params.width * params.length;
        let carriers_quantity = area * surface_carrier_density;
        let cell_carriers = (carriers_quantity / total_cells as f64).floor() as u64;

        Ok(Self {
            params,
            surface_carrier_density,
            total_cells,
            cell_carriers,
            carriers_quantity,
        })
    }

    pub fn params(&self) -> &NanoFiberParams {
        &self.params
    }

    pub fn width(&self) -> f64 {
        self.params.width
    }

    pub fn length(&self) -> f64 {
        self.params.length
    }

    pub fn n_x(&self) -> usize {
        self.params.n_x
    }

    pub fn n_y(&self) -> usize {
        self.params.n_y
    }

    pub fn material(&self) -> &GasSpecies {
        &self.params.material
    }

    /// `(n_y, n_x)`
    pub fn grid_size(&self) -> (usize, usize) {
        (self.params.n_y, self.params.n_x)
    }

    pub fn total_cells(&self) -> usize {
        self.total_cells
    }

    pub fn surface_carrier_density(&self) -> f64 {
        self.surface_carrier_density
    }

    pub fn cell_carriers(&self) -> u64 {
        self.cell_carriers
    }

    pub fn carriers_quantity(&self) -> f64 {
        self.carriers_quantity
    }
}

impl Summary for NanoFiberGrid {
    fn summary(&self) -> Report {
        Report::new("Nanofiber")
            .row("Sensing Material", self.material().name.as_str())
            .row("Nanofiber Width [m]", self.width())
            .row("Nanofiber Length [m]", self.length())
            .row("Mesh number in Width", self.n_x())
            .row("Mesh number in Length", self.n_y())
            .row("Surface Carrier Density", self.surface_carrier_density)
            .row("Cell Carriers", self.cell_carriers)
            .row("Carriers Quantity", self.carriers_quantity)
    }
}
