// Engine behaviour over whole runs: monotonic grids, convergence and run limits

use gas_sensor_sim::constants::{ATMOSPHERIC_PRESSURE_PA, ROOM_TEMPERATURE_K};
use gas_sensor_sim::environment::{Environment, EnvironmentParams};
use gas_sensor_sim::material::MaterialType;
use gas_sensor_sim::nanofiber::{NanoFiberGrid, NanoFiberParams};
use gas_sensor_sim::sim::sim_op::{CsvWriterOp, ProgressReporterOp, SimOp, SimOpHandle};
use gas_sensor_sim::sim::{GasSensorSimulation, RunLimits, SimProps};
use gas_sensor_sim::{SimError, StopReason};
use more_asserts::{assert_ge, assert_le, assert_lt};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

fn create_test_simulation(concentration: f64, seed: u64, limits: RunLimits) -> GasSensorSimulation {
    init_logging();
    let environment = Environment::new(EnvironmentParams {
        temperature: ROOM_TEMPERATURE_K,
        pressure: ATMOSPHERIC_PRESSURE_PA,
        container_volume: 1e-3,
        concentration,
        max_distance: 1e-6,
        active_gas: MaterialType::H2.species(),
        passive_gas: MaterialType::Air.species(),
    })
    .unwrap();
    let nanofiber = NanoFiberGrid::new(NanoFiberParams {
        width: 2e-7,
        length: 1e-5,
        n_x: 10,
        n_y: 10,
        material: MaterialType::TiO2Anatase.species(),
    })
    .unwrap();

    GasSensorSimulation::new(SimProps {
        name: "engine_test".to_string(),
        environment,
        nanofiber,
        ops: vec![],
        limits,
        seed: Some(seed),
    })
    .unwrap()
}

/// Records the active cell ratio after every iteration.
struct RatioRecorderOp {
    ratios: Rc<RefCell<Vec<f64>>>,
}

impl SimOp for RatioRecorderOp {
    fn name(&self) -> &str {
        "RatioRecorderOp"
    }

    fn init_sim(&mut self, sim: &GasSensorSimulation) {
        self.ratios.borrow_mut().push(sim.active_cell_ratio());
    }

    fn update_sim(&mut self, sim: &GasSensorSimulation) {
        self.ratios.borrow_mut().push(sim.active_cell_ratio());
    }
}

/// Wraps a progress reporter and records the percentage it settles on each iteration.
struct ProgressRecorderOp {
    reporter: ProgressReporterOp,
    percents: Rc<RefCell<Vec<f64>>>,
}

impl SimOp for ProgressRecorderOp {
    fn name(&self) -> &str {
        "ProgressRecorderOp"
    }

    fn init_sim(&mut self, sim: &GasSensorSimulation) {
        self.reporter.init_sim(sim);
    }

    fn update_sim(&mut self, sim: &GasSensorSimulation) {
        self.reporter.update_sim(sim);
        self.percents.borrow_mut().push(self.reporter.percent());
    }

    fn after_sim(&mut self, sim: &GasSensorSimulation) {
        self.reporter.after_sim(sim);
        self.percents.borrow_mut().push(self.reporter.percent());
    }
}

#[test]
fn test_initial_state() {
    let sim = create_test_simulation(0.5, 1, RunLimits::default());

    assert_eq!(sim.active_cell_ratio(), 1.0);
    assert_eq!(sim.iterations(), 0);
    assert_eq!(sim.simulation_time(), 0.0);
    assert!(sim.state_mtx().iter().all(|&active| active));
    assert!(sim.time_mtx().iter().all(|&t| t == 0.0));
}

#[test]
fn test_active_cell_ratio_never_increases() {
    let ratios = Rc::new(RefCell::new(Vec::new()));
    let mut sim = create_test_simulation(0.05, 2, RunLimits::with_max_iterations(10_000));
    sim.add_op(SimOpHandle::new(Box::new(RatioRecorderOp {
        ratios: ratios.clone(),
    })));

    let summary = sim.run(0.1).unwrap();
    let ratios = ratios.borrow();

    println!("🧪 {} iterations, ratios {:?}", summary.iterations, &ratios[..ratios.len().min(10)]);
    assert_eq!(ratios.len() as u64, summary.iterations + 1);
    assert_eq!(ratios[0], 1.0);
    for pair in ratios.windows(2) {
        assert_le!(pair[1], pair[0]);
    }
    assert_lt!(summary.active_cell_ratio, 0.1);
}

#[test]
fn test_time_matrix_is_monotonic_and_cells_never_reactivate() {
    let mut sim = create_test_simulation(0.1, 3, RunLimits::default());

    let mut previous_time = sim.time_mtx().clone();
    let mut previous_state = sim.state_mtx().clone();
    let mut deactivations = 0;
    for _ in 0..40 {
        sim.step();
        for ((&before, &after), (&was_active, &is_active)) in previous_time
            .iter()
            .zip(sim.time_mtx().iter())
            .zip(previous_state.iter().zip(sim.state_mtx().iter()))
        {
            assert_ge!(after, 0.0);
            assert_ge!(after, before);
            // true -> false only
            assert!(was_active || !is_active);
            // inactive cells stop accumulating time
            if !was_active {
                assert_eq!(after, before);
            }
            // a cell deactivated in this iteration gets no credit for it
            if was_active && !is_active {
                deactivations += 1;
                assert_eq!(after, before);
            }
        }
        previous_time = sim.time_mtx().clone();
        previous_state = sim.state_mtx().clone();
    }
    assert_eq!(sim.iterations(), 40);
    // concentration 0.1 over 40 iterations leaves almost no cell untouched
    assert_ge!(deactivations, 50);
}

#[test]
fn test_full_concentration_deactivates_everything_in_one_iteration() {
    for threshold in [1.0, 0.8, 0.5, 0.01, 1e-9] {
        let mut sim = create_test_simulation(1.0, 4, RunLimits::default());
        let summary = sim.run(threshold).unwrap();

        assert_eq!(summary.iterations, 1, "threshold {threshold}");
        assert_eq!(summary.active_cell_ratio, 0.0);
        assert_eq!(sim.active_cells(), 0);
    }
}

#[test]
fn test_zero_concentration_is_rejected_before_running() {
    init_logging();
    let environment = Environment::new(EnvironmentParams {
        temperature: ROOM_TEMPERATURE_K,
        pressure: ATMOSPHERIC_PRESSURE_PA,
        container_volume: 1e-3,
        concentration: 0.0,
        max_distance: 1e-6,
        active_gas: MaterialType::H2.species(),
        passive_gas: MaterialType::Air.species(),
    })
    .unwrap();
    let nanofiber = NanoFiberGrid::new(NanoFiberParams {
        width: 2e-7,
        length: 1e-5,
        n_x: 10,
        n_y: 10,
        material: MaterialType::TiO2Anatase.species(),
    })
    .unwrap();

    let result = GasSensorSimulation::new(SimProps {
        name: "no_active_gas".to_string(),
        environment,
        nanofiber,
        ops: vec![],
        limits: RunLimits::default(),
        seed: Some(5),
    });

    match result {
        Err(SimError::InsufficientActiveGas {
            active_gas_quantity,
            carriers_quantity,
        }) => {
            assert_eq!(active_gas_quantity, 0.0);
            assert!(carriers_quantity > 0.0);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("zero concentration must not build a simulation"),
    }
}

#[test]
fn test_vanishing_concentration_hits_iteration_cap() {
    // enough active molecules to pass the supply check, far too few to ever react
    let mut sim = create_test_simulation(1e-12, 6, RunLimits::with_max_iterations(500));

    match sim.run(0.8) {
        Err(SimError::DidNotConverge {
            reason,
            iterations,
            active_cell_ratio,
        }) => {
            assert_eq!(reason, StopReason::IterationLimit);
            assert_eq!(iterations, 500);
            assert_eq!(active_cell_ratio, 1.0);
        }
        other => panic!("expected DidNotConverge, got {:?}", other.map(|s| s.iterations)),
    }
    assert_eq!(sim.iterations(), 500);
    assert_eq!(sim.active_cell_ratio(), 1.0);
    // every cell kept accumulating exposure time
    assert!(sim.time_mtx().iter().all(|&t| t > 0.0));
}

#[test]
fn test_wall_time_limit() {
    let limits = RunLimits {
        max_iterations: None,
        max_wall_time: Some(Duration::ZERO),
        cancel: None,
    };
    let mut sim = create_test_simulation(1e-12, 7, limits);

    let result = sim.run(0.8);
    assert!(matches!(
        result,
        Err(SimError::DidNotConverge {
            reason: StopReason::WallTimeLimit,
            ..
        })
    ));
}

#[test]
fn test_cancellation_flag_stops_the_run() {
    let cancel = Arc::new(AtomicBool::new(true));
    let limits = RunLimits {
        max_iterations: None,
        max_wall_time: None,
        cancel: Some(cancel.clone()),
    };
    let mut sim = create_test_simulation(0.5, 8, limits);

    let result = sim.run(0.8);
    assert!(matches!(
        result,
        Err(SimError::DidNotConverge {
            reason: StopReason::Cancelled,
            iterations: 0,
            ..
        })
    ));
    assert_eq!(sim.iterations(), 0);
}

#[test]
fn test_progress_is_monotonic_and_completes() {
    let percents = Rc::new(RefCell::new(Vec::new()));
    let mut sim = create_test_simulation(0.02, 9, RunLimits::with_max_iterations(10_000));
    sim.add_op(SimOpHandle::new(Box::new(ProgressRecorderOp {
        reporter: ProgressReporterOp::new(10.0),
        percents: percents.clone(),
    })));

    sim.run(0.3).unwrap();
    let percents = percents.borrow();

    assert!(!percents.is_empty());
    for pair in percents.windows(2) {
        assert_le!(pair[0], pair[1]);
    }
    assert!(percents.iter().all(|&p| (0.0..=100.0).contains(&p)));
    assert_eq!(*percents.last().unwrap(), 100.0);
}

#[test]
fn test_csv_writer_logs_every_iteration() {
    let path = std::env::temp_dir().join(format!("gas_sensor_iterations_{}.csv", std::process::id()));
    let mut sim = create_test_simulation(0.1, 10, RunLimits::default());
    sim.add_op(CsvWriterOp::handle(path.clone()));

    let summary = sim.run(0.5).unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let lines: Vec<&str> = contents.lines().collect();
    assert!(lines[0].starts_with("iteration,active_cell_ratio"));
    // header + initial row + one per iteration
    assert_eq!(lines.len() as u64, summary.iterations + 2);
    assert!(lines[1].starts_with("0,1,"));
    let last_iteration = lines.last().unwrap().split(',').next().unwrap();
    assert_eq!(last_iteration, summary.iterations.to_string());
}

#[test]
fn test_independent_seeds_diverge() {
    let mut a = create_test_simulation(0.3, 11, RunLimits::default());
    let mut b = create_test_simulation(0.3, 12, RunLimits::default());
    a.step();
    b.step();
    assert_ne!(a.time_mtx(), b.time_mtx());
}
