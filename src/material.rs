// src/material.rs - Gas and sensing material registry

use crate::constants::AVOGADRO;
use crate::error::{SimResult, require_positive};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialType {
    #[serde(rename = "H2")]
    H2,
    #[serde(rename = "TiO2 Rutile")]
    TiO2Rutile,
    #[serde(rename = "TiO2 Anatase")]
    TiO2Anatase,
    #[serde(rename = "N2")]
    N2,
    #[serde(rename = "O2")]
    O2,
    #[serde(rename = "Ar")]
    Ar,
    #[serde(rename = "Air")]
    Air,
}

impl MaterialType {
    pub const ALL: [MaterialType; 7] = [
        MaterialType::H2,
        MaterialType::TiO2Rutile,
        MaterialType::TiO2Anatase,
        MaterialType::N2,
        MaterialType::O2,
        MaterialType::Ar,
        MaterialType::Air,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialType::H2 => "H2",
            MaterialType::TiO2Rutile => "TiO2 Rutile",
            MaterialType::TiO2Anatase => "TiO2 Anatase",
            MaterialType::N2 => "N2",
            MaterialType::O2 => "O2",
            MaterialType::Ar => "Ar",
            MaterialType::Air => "Air",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// An owned copy of the registry entry for this material.
    pub fn species(&self) -> GasSpecies {
        // the table holds every variant
        MATERIAL_PROFILES[self].clone()
    }
}

/// A named substance with its solid-state density (kg/m³) and molar mass (kg/mol).
///
/// Used both for the two gases of an [`Environment`](crate::environment::Environment)
/// and for the sensing material of a [`NanoFiberGrid`](crate::nanofiber::NanoFiberGrid).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasSpecies {
    pub name: String,
    pub density: f64,
    pub molar_mass: f64,
}

impl GasSpecies {
    pub fn new(name: impl Into<String>, density: f64, molar_mass: f64) -> Self {
        Self {
            name: name.into(),
            density,
            molar_mass,
        }
    }

    pub fn molecular_diameter(&self) -> f64 {
        molecular_diameter(self.density, self.molar_mass)
    }

    pub fn validate(&self) -> SimResult<()> {
        require_positive(&format!("{} density", self.name), self.density)?;
        require_positive(&format!("{} molar mass", self.name), self.molar_mass)
    }
}

/// Closest-packing molecular diameter (m) from solid-state density and molar mass.
pub fn molecular_diameter(density: f64, molar_mass: f64) -> f64 {
    let moles_per_volume = density / molar_mass;
    let molecule_volume = 1.0 / (moles_per_volume * AVOGADRO);
    ((6.0 * molecule_volume) / PI).cbrt()
}

fn build_profile(kind: MaterialType) -> GasSpecies {
    use MaterialType::*;
    match kind {
        H2 => GasSpecies::new("H2", 86.0, 2.01588e-3), // solid state
        TiO2Rutile => GasSpecies::new("TiO2 Rutile", 4.23e3, 79.866e-3),
        TiO2Anatase => GasSpecies::new("TiO2 Anatase", 3.78e3, 79.866e-3),
        N2 => GasSpecies::new("N2", 1026.5, 28.0134e-3), // solid state
        O2 => GasSpecies::new("O2", 687.5, 32e-3),       // solid state
        Ar => GasSpecies::new("Ar", 1616.0, 39.948e-3),  // solid state
        Air => {
            // 78% N2, 21% O2, 1% Ar
            let (n2, o2, ar) = (build_profile(N2), build_profile(O2), build_profile(Ar));
            GasSpecies::new(
                "Air",
                0.78 * n2.density + 0.21 * o2.density + 0.01 * ar.density,
                0.78 * n2.molar_mass + 0.21 * o2.molar_mass + 0.01 * ar.molar_mass,
            )
        }
    }
}

pub static MATERIAL_PROFILES: Lazy<HashMap<MaterialType, GasSpecies>> = Lazy::new(|| {
    MaterialType::ALL
        .into_iter()
        .map(|kind| (kind, build_profile(kind)))
        .collect()
});

pub fn get_profile(kind: MaterialType) -> Option<&'static GasSpecies> {
    MATERIAL_PROFILES.get(&kind)
}
