use crate::constants::{DEFAULT_MAX_ITERATIONS, ELEMENTARY_CHARGE};
use crate::environment::Environment;
use crate::error::{SimError, SimResult, StopReason};
use crate::grid::Grid;
use crate::nanofiber::NanoFiberGrid;
use crate::report::{Report, Summary};
use crate::sim::sim_op::{SimOp, SimOpHandle};
use crate::velocity_distribution::VelocityDistribution;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Role a gas species plays at the sensor surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GasRole {
    /// Deactivates a carrier cell on contact
    Active,
    /// Inert
    Passive,
}

/// One species of the gas mixture with its exposure probability and speed table.
#[derive(Debug, Clone)]
pub struct MixtureComponent {
    pub name: String,
    pub role: GasRole,
    pub probability: f64,
    pub velocities: VelocityDistribution,
}

/// Bounds that keep [`GasSensorSimulation::run`] from blocking forever.
#[derive(Debug, Clone)]
pub struct RunLimits {
    pub max_iterations: Option<u64>,
    pub max_wall_time: Option<Duration>,
    /// Polled once per iteration; setting it stops the run.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            max_iterations: Some(DEFAULT_MAX_ITERATIONS),
            max_wall_time: None,
            cancel: None,
        }
    }
}

impl RunLimits {
    pub fn unbounded() -> Self {
        Self {
            max_iterations: None,
            max_wall_time: None,
            cancel: None,
        }
    }

    pub fn with_max_iterations(max_iterations: u64) -> Self {
        Self {
            max_iterations: Some(max_iterations),
            ..Self::unbounded()
        }
    }
}

pub struct SimProps {
    pub name: String,
    pub environment: Environment,
    pub nanofiber: NanoFiberGrid,
    pub ops: Vec<SimOpHandle>,
    pub limits: RunLimits,
    /// `None` seeds from the operating system
    pub seed: Option<u64>,
}

/// Result of a converged run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub iterations: u64,
    pub active_cell_ratio: f64,
    pub simulation_time: f64,
    pub elapsed: Duration,
}

/// Monte Carlo engine over the nanofiber cell grid.
///
/// `state_mtx` marks cells that are still electrically active; it only ever
/// flips from `true` to `false`. `time_mtx` accumulates each cell's exposure
/// time and never decreases.
pub struct GasSensorSimulation {
    pub name: String,
    environment: Environment,
    nanofiber: NanoFiberGrid,
    mixture: Vec<MixtureComponent>,
    exposure: WeightedIndex<f64>,
    state_mtx: Grid<bool>,
    time_mtx: Grid<f64>,
    iterations: u64,
    active_cells: usize,
    simulation_time: f64,
    target_ratio: Option<f64>,
    limits: RunLimits,
    ops: Vec<Box<dyn SimOp>>,
    rng: StdRng,
    seed: Option<u64>,
}

impl GasSensorSimulation {
    pub fn new(props: SimProps) -> SimResult<GasSensorSimulation> {
        let SimProps {
            name,
            environment,
            nanofiber,
            ops,
            limits,
            seed,
        } = props;

        let supply_ratio = environment.active_gas_quantity() / nanofiber.carriers_quantity();
        if !(supply_ratio >= 1.0) {
            return Err(SimError::InsufficientActiveGas {
                active_gas_quantity: environment.active_gas_quantity(),
                carriers_quantity: nanofiber.carriers_quantity(),
            });
        }

        let mixture = build_mixture(&environment)?;
        let weights: Vec<f64> = mixture.iter().map(|c| c.probability).collect();
        let exposure = WeightedIndex::new(&weights)
            .map_err(|e| SimError::invalid(format!("gas mixture weights: {e}")))?;

        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };

        let (n_y, n_x) = nanofiber.grid_size();
        let total_cells = nanofiber.total_cells();

        log::debug!(
            "{}: {}x{} cells, {} carriers per cell, active gas supply ratio {:.3e}",
            name,
            n_x,
            n_y,
            nanofiber.cell_carriers(),
            supply_ratio
        );

        Ok(GasSensorSimulation {
            name,
            state_mtx: Grid::filled(n_x, n_y, true),
            time_mtx: Grid::filled(n_x, n_y, 0.0),
            environment,
            nanofiber,
            mixture,
            exposure,
            iterations: 0,
            active_cells: total_cells,
            simulation_time: 0.0,
            target_ratio: None,
            limits,
            ops: ops.into_iter().map(|handle| handle.op).collect(),
            rng,
            seed,
        })
    }

    /// Rebuilds an engine around previously recorded grids.
    pub(crate) fn restore(
        props: SimProps,
        state_mtx: Grid<bool>,
        time_mtx: Grid<f64>,
        iterations: u64,
    ) -> SimResult<GasSensorSimulation> {
        let mut sim = GasSensorSimulation::new(props)?;
        let (n_y, n_x) = sim.nanofiber.grid_size();
        for (label, shape, consistent) in [
            ("state", state_mtx.shape(), state_mtx.is_consistent()),
            ("time", time_mtx.shape(), time_mtx.is_consistent()),
        ] {
            if shape != (n_y, n_x) || !consistent {
                return Err(SimError::invalid(format!(
                    "recorded {label} matrix is {}x{}, nanofiber grid is {n_y}x{n_x}",
                    shape.0, shape.1
                )));
            }
        }
        if time_mtx.iter().any(|t| !(t.is_finite() && *t >= 0.0)) {
            return Err(SimError::invalid("recorded exposure times must be finite and non-negative"));
        }

        sim.active_cells = state_mtx.iter().filter(|&&active| active).count();
        sim.simulation_time = state_mtx
            .iter()
            .zip(time_mtx.iter())
            .filter(|(active, _)| !**active)
            .map(|(_, &t)| t)
            .fold(0.0, f64::max);
        sim.state_mtx = state_mtx;
        sim.time_mtx = time_mtx;
        sim.iterations = iterations;
        Ok(sim)
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn nanofiber(&self) -> &NanoFiberGrid {
        &self.nanofiber
    }

    pub fn mixture(&self) -> &[MixtureComponent] {
        &self.mixture
    }

    pub fn state_mtx(&self) -> &Grid<bool> {
        &self.state_mtx
    }

    pub fn time_mtx(&self) -> &Grid<f64> {
        &self.time_mtx
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn limits(&self) -> &RunLimits {
        &self.limits
    }

    pub fn set_limits(&mut self, limits: RunLimits) {
        self.limits = limits;
    }

    pub fn add_op(&mut self, handle: SimOpHandle) {
        self.ops.push(handle.op);
    }

    /// Threshold of the run in progress, or of the last one.
    pub fn target_ratio(&self) -> Option<f64> {
        self.target_ratio
    }

    pub fn active_cells(&self) -> usize {
        self.active_cells
    }

    pub fn active_cell_ratio(&self) -> f64 {
        self.active_cells as f64 / self.nanofiber.total_cells() as f64
    }

    pub fn is_converged(&self, active_cell_ratio_to_converge: f64) -> bool {
        self.active_cell_ratio() < active_cell_ratio_to_converge
    }

    /// Largest recorded exposure time among deactivated cells.
    pub fn simulation_time(&self) -> f64 {
        self.simulation_time
    }

    /// Current at full saturation of every carrier.
    pub fn maximum_current(&self) -> f64 {
        self.nanofiber.carriers_quantity() * ELEMENTARY_CHARGE
    }

    /// One Monte Carlo iteration over every cell.
    ///
    /// The state is masked before the time credit is gated, so a cell that
    /// deactivates in this iteration receives no exposure time for it.
    pub fn step(&mut self) {
        let max_distance = self.environment.max_distance();
        let cells = self
            .state_mtx
            .as_mut_slice()
            .iter_mut()
            .zip(self.time_mtx.as_mut_slice().iter_mut());

        for (active, time) in cells {
            let component = &self.mixture[self.exposure.sample(&mut self.rng)];
            if *active && component.role == GasRole::Active {
                *active = false;
                self.active_cells -= 1;
                self.simulation_time = self.simulation_time.max(*time);
            }

            let speed = component.velocities.sample_one(&mut self.rng);
            let distance = self.rng.random::<f64>() * max_distance;
            if *active {
                *time += distance / speed;
            }
        }

        self.iterations += 1;
    }

    /// Iterates while the active cell ratio is at or above `active_cell_ratio_to_converge`.
    pub fn run(&mut self, active_cell_ratio_to_converge: f64) -> SimResult<RunSummary> {
        let threshold = active_cell_ratio_to_converge;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(SimError::invalid(format!(
                "convergence threshold must lie in (0, 1], got {threshold}"
            )));
        }

        self.target_ratio = Some(threshold);
        let started = Instant::now();
        let start_iterations = self.iterations;

        log::info!(
            "{}: solving to active cell ratio < {} (concentration {})",
            self.name,
            threshold,
            self.environment.concentration()
        );

        self.simulate_init();
        let stopped = loop {
            if self.is_converged(threshold) {
                break None;
            }
            if let Some(reason) = self.limit_reached(started, self.iterations - start_iterations) {
                break Some(reason);
            }
            self.step();
            self.simulate_step();
        };
        self.simulate_end();

        match stopped {
            None => {
                log::info!(
                    "{}: converged after {} iterations, ACR {:.3e}, simulated time {:.3e} s",
                    self.name,
                    self.iterations,
                    self.active_cell_ratio(),
                    self.simulation_time
                );
                Ok(RunSummary {
                    iterations: self.iterations,
                    active_cell_ratio: self.active_cell_ratio(),
                    simulation_time: self.simulation_time,
                    elapsed: started.elapsed(),
                })
            }
            Some(reason) => {
                log::warn!(
                    "{}: stopped without converging ({}) after {} iterations, ACR {:.3e}",
                    self.name,
                    reason,
                    self.iterations,
                    self.active_cell_ratio()
                );
                Err(SimError::DidNotConverge {
                    reason,
                    iterations: self.iterations,
                    active_cell_ratio: self.active_cell_ratio(),
                })
            }
        }
    }

    fn limit_reached(&self, started: Instant, iterations_this_run: u64) -> Option<StopReason> {
        if let Some(cancel) = &self.limits.cancel {
            if cancel.load(Ordering::Relaxed) {
                return Some(StopReason::Cancelled);
            }
        }
        if let Some(max) = self.limits.max_iterations {
            if iterations_this_run >= max {
                return Some(StopReason::IterationLimit);
            }
        }
        if let Some(max) = self.limits.max_wall_time {
            if started.elapsed() >= max {
                return Some(StopReason::WallTimeLimit);
            }
        }
        None
    }

    fn simulate_init(&mut self) {
        let mut ops = std::mem::take(&mut self.ops);
        for op in &mut ops {
            op.init_sim(self);
        }
        self.ops = ops;
    }

    fn simulate_step(&mut self) {
        let mut ops = std::mem::take(&mut self.ops);
        for op in &mut ops {
            op.update_sim(self);
        }
        self.ops = ops;
    }

    fn simulate_end(&mut self) {
        let mut ops = std::mem::take(&mut self.ops);
        for op in &mut ops {
            op.after_sim(self);
        }
        self.ops = ops;
    }
}

fn build_mixture(environment: &Environment) -> SimResult<Vec<MixtureComponent>> {
    let temperature = environment.temperature();
    let concentration = environment.concentration();
    Ok(vec![
        MixtureComponent {
            name: environment.active_gas().name.clone(),
            role: GasRole::Active,
            probability: concentration,
            velocities: VelocityDistribution::new(temperature, environment.active_gas().molar_mass)?,
        },
        MixtureComponent {
            name: environment.passive_gas().name.clone(),
            role: GasRole::Passive,
            probability: 1.0 - concentration,
            velocities: VelocityDistribution::new(temperature, environment.passive_gas().molar_mass)?,
        },
    ])
}

impl Summary for GasSensorSimulation {
    fn summary(&self) -> Report {
        let env = &self.environment;
        let fiber = &self.nanofiber;
        Report::new(format!("Simulation: {}", self.name))
            .row("Sensing Material", fiber.material().name.as_str())
            .row("Active Gas", env.active_gas().name.as_str())
            .row("Passive Gas", env.passive_gas().name.as_str())
            .row("Iteration Number", self.iterations)
            .row("Active Cells Ratio", self.active_cell_ratio())
            .row("Simulation Time [s]", self.simulation_time)
            .row("Maximum Current [A]", self.maximum_current())
            .row("Active Gas Concentration", env.concentration())
            .row("Nanofiber Width [m]", fiber.width())
            .row("Nanofiber Length [m]", fiber.length())
            .row("Mesh number in Width", fiber.n_x())
            .row("Mesh number in Length", fiber.n_y())
            .row("Container Pressure [Pa]", env.pressure())
            .row("Container Temperature [K]", env.temperature())
            .row("Container Volume [m^3]", env.container_volume())
            .row("Max Distance [m]", env.max_distance())
    }
}
