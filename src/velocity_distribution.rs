//! Discretized Maxwell–Boltzmann speed distribution used as a sampling table.

use crate::constants::{AVOGADRO, BOLTZMANN, GAS_CONSTANT, VELOCITY_SAMPLES, VELOCITY_SPAN_FACTOR};
use crate::error::{SimError, SimResult, require_positive};
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use std::f64::consts::PI;

/// Maxwell–Boltzmann speed density `f(v)` for a molecule of mass `molecule_mass` (kg).
pub fn maxwell_boltzmann_density(speed: f64, temperature: f64, molecule_mass: f64) -> f64 {
    let kt = BOLTZMANN * temperature;
    let expr1 = 4.0 * PI * speed.powi(2);
    let expr2 = (molecule_mass / (2.0 * PI * kt)).powf(1.5);
    let expr3 = (-molecule_mass * speed.powi(2) / (2.0 * kt)).exp();
    expr1 * expr2 * expr3
}

/// Mean thermal speed `sqrt(2RT/M)` for molar mass `M` (kg/mol).
pub fn mean_thermal_speed(temperature: f64, molar_mass: f64) -> f64 {
    ((2.0 * GAS_CONSTANT * temperature) / molar_mass).sqrt()
}

/// 100 `(speed, probability)` pairs spanning `[0, 3 × mean speed]`.
///
/// The `v = 0` entry carries weight exactly zero and the weighted sampler never
/// returns zero-weight entries, so every sampled speed is strictly positive.
#[derive(Debug, Clone)]
pub struct VelocityDistribution {
    speeds: Vec<f64>,
    probabilities: Vec<f64>,
    index: WeightedIndex<f64>,
}

impl VelocityDistribution {
    pub fn new(temperature: f64, molar_mass: f64) -> SimResult<Self> {
        require_positive("temperature", temperature)?;
        require_positive("molar mass", molar_mass)?;

        let molecule_mass = molar_mass / AVOGADRO;
        let top_speed = VELOCITY_SPAN_FACTOR * mean_thermal_speed(temperature, molar_mass);
        let step = top_speed / (VELOCITY_SAMPLES - 1) as f64;

        let speeds: Vec<f64> = (0..VELOCITY_SAMPLES).map(|i| i as f64 * step).collect();
        let densities: Vec<f64> = speeds
            .iter()
            .map(|&v| maxwell_boltzmann_density(v, temperature, molecule_mass))
            .collect();

        let total: f64 = densities.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            return Err(SimError::invalid(format!(
                "speed distribution at {temperature} K for molar mass {molar_mass} has no usable weight"
            )));
        }
        let probabilities: Vec<f64> = densities.iter().map(|d| d / total).collect();

        let index = WeightedIndex::new(&probabilities)
            .map_err(|e| SimError::invalid(format!("speed distribution weights: {e}")))?;

        Ok(Self {
            speeds,
            probabilities,
            index,
        })
    }

    pub fn speeds(&self) -> &[f64] {
        &self.speeds
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// One speed drawn according to the table weights.
    pub fn sample_one<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.speeds[self.index.sample(rng)]
    }

    /// `k` independent draws with replacement.
    pub fn sample<R: Rng + ?Sized>(&self, k: usize, rng: &mut R) -> Vec<f64> {
        (0..k).map(|_| self.sample_one(rng)).collect()
    }
}
