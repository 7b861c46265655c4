//! Reconstruction of the current-vs-time curve from a finished simulation.

use crate::constants::ELEMENTARY_CHARGE;
use crate::error::{SimError, SimResult};
use crate::sim::GasSensorSimulation;
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub time: f64,    // s
    pub current: f64, // A
}

/// A simulated point next to the fitted model's value at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedPoint {
    pub time: f64,
    pub current: f64,
    pub fitted: f64,
}

/// Saturation model `I(t) = I_max·(1 − exp(−b·t))`.
///
/// `I_max` is the sensor's maximum current; `b` is solved in closed form from a
/// single boundary point, not fitted by least squares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentEstimator {
    i_max: f64,
    b: f64,
}

impl CurrentEstimator {
    pub fn from_point(i_max: f64, t_last: f64, i_last: f64) -> SimResult<Self> {
        if !(i_max.is_finite() && i_max > 0.0) {
            return Err(SimError::DegenerateFit(format!("maximum current must be positive, got {i_max}")));
        }
        if !(t_last.is_finite() && t_last > 0.0) {
            return Err(SimError::DegenerateFit(format!("last sample time must be positive, got {t_last}")));
        }
        if !(i_last < i_max) {
            return Err(SimError::DegenerateFit(format!(
                "last sampled current {i_last:e} is not below the maximum {i_max:e}"
            )));
        }

        let b = -(1.0 / t_last) * ((i_max - i_last) / i_max).ln();
        Ok(Self { i_max, b })
    }

    /// Solves `b` from the last point of `curve`.
    pub fn fit(curve: &[CurvePoint], i_max: f64) -> SimResult<Self> {
        let last = curve
            .last()
            .ok_or_else(|| SimError::DegenerateFit("current curve is empty".to_string()))?;
        Self::from_point(i_max, last.time, last.current)
    }

    pub fn i_max(&self) -> f64 {
        self.i_max
    }

    pub fn rate(&self) -> f64 {
        self.b
    }

    pub fn estimate(&self, time: f64) -> f64 {
        self.i_max * (1.0 - (-self.b * time).exp())
    }
}

/// Read-only view over a simulation's final matrices.
pub struct PostProcessor<'a> {
    sim: &'a GasSensorSimulation,
}

impl<'a> PostProcessor<'a> {
    pub fn new(sim: &'a GasSensorSimulation) -> Self {
        Self { sim }
    }

    /// Sorted distinct values of the exposure-time matrix.
    pub fn distinct_times(&self) -> Vec<f64> {
        let mut times: Vec<f64> = self.sim.time_mtx().iter().copied().collect();
        times.sort_by(f64::total_cmp);
        times.dedup();
        times
    }

    /// Cells counted active at `time`: recorded later than `time`, or never deactivated.
    pub fn active_count_at(&self, time: f64) -> usize {
        self.sim
            .state_mtx()
            .iter()
            .zip(self.sim.time_mtx().iter())
            .filter(|(active, t)| **active || **t > time)
            .count()
    }

    pub fn current_at(&self, time: f64) -> f64 {
        let deactivated = self.sim.nanofiber().total_cells() - self.active_count_at(time);
        self.current_for(deactivated)
    }

    fn current_for(&self, deactivated_cells: usize) -> f64 {
        deactivated_cells as f64 * ELEMENTARY_CHARGE * self.sim.nanofiber().cell_carriers() as f64
    }

    /// `(t, I(t))` for every distinct recorded time, ascending in `t`.
    pub fn time_current_curve(&self) -> Vec<CurvePoint> {
        let mut deactivation_times: Vec<f64> = self
            .sim
            .state_mtx()
            .iter()
            .zip(self.sim.time_mtx().iter())
            .filter(|(active, _)| !**active)
            .map(|(_, &t)| t)
            .collect();
        deactivation_times.sort_by(f64::total_cmp);

        let mut deactivated = 0;
        self.distinct_times()
            .into_iter()
            .map(|time| {
                while deactivated < deactivation_times.len() && deactivation_times[deactivated] <= time {
                    deactivated += 1;
                }
                CurvePoint {
                    time,
                    current: self.current_for(deactivated),
                }
            })
            .collect()
    }

    pub fn current_estimator(&self) -> SimResult<CurrentEstimator> {
        CurrentEstimator::fit(&self.time_current_curve(), self.sim.maximum_current())
    }

    /// Every `total_cells / datapoints`-th curve point next to the fitted model.
    pub fn sampled_curve(&self, datapoints: usize) -> SimResult<Vec<FittedPoint>> {
        if datapoints == 0 {
            return Err(SimError::invalid("at least one data point is required"));
        }
        let curve = self.time_current_curve();
        let estimator = CurrentEstimator::fit(&curve, self.sim.maximum_current())?;
        let interval = (self.sim.nanofiber().total_cells() / datapoints).max(1);

        Ok(curve
            .iter()
            .step_by(interval)
            .map(|point| FittedPoint {
                time: point.time,
                current: point.current,
                fitted: estimator.estimate(point.time),
            })
            .collect())
    }

    /// Writes the full curve as `time_s,current_a` rows.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> SimResult<()> {
        writeln!(writer, "time_s,current_a")?;
        for point in self.time_current_curve() {
            writeln!(writer, "{:e},{:e}", point.time, point.current)?;
        }
        writer.flush()?;
        Ok(())
    }
}
