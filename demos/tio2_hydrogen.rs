/// Hydrogen on a TiO2 anatase nanofiber
///
/// Runs the exposure simulation to convergence, prints the configuration
/// reports and a sampled current curve next to the fitted saturation model.
/// The full curve and the finished simulation are written to the system
/// temp directory.
use gas_sensor_sim::constants::{ATMOSPHERIC_PRESSURE_PA, ROOM_TEMPERATURE_K};
use gas_sensor_sim::material::MaterialType;
use gas_sensor_sim::persistence;
use gas_sensor_sim::postprocess::PostProcessor;
use gas_sensor_sim::report::Summary;
use gas_sensor_sim::setup::{RunConfig, SimulationSetup};
use std::fs::File;
use std::io::BufWriter;

const DATAPOINTS: usize = 20;

fn default_setup() -> SimulationSetup {
    SimulationSetup {
        name: "tio2_hydrogen".to_string(),
        nano_fiber_width: 2e-7,
        nano_fiber_length: 1e-5,
        n_x: 40,
        n_y: 40,
        nano_fiber_material: MaterialType::TiO2Anatase.into(),
        temperature: ROOM_TEMPERATURE_K,
        pressure: ATMOSPHERIC_PRESSURE_PA,
        container_volume: 1e-3,
        concentration: 0.01,
        max_distance: 1e-6,
        active_gas: MaterialType::H2.into(),
        passive_gas: MaterialType::Air.into(),
        run: RunConfig {
            convergence_threshold: 0.05,
            seed: Some(42),
            ..RunConfig::default()
        },
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let setup = default_setup();
    let out_dir = std::env::temp_dir();

    println!("🧪 Gas sensor simulation: {}", setup.name);
    println!("{}", "=".repeat(70));

    let mut sim = setup.build()?;
    println!("{}", sim.environment().summary());
    println!("{}", sim.nanofiber().summary());

    let result = sim.run(setup.run.convergence_threshold)?;
    println!(
        "✅ Converged after {} iterations in {:.2?} (ACR {:.3}, simulated {:.3e} s)",
        result.iterations, result.elapsed, result.active_cell_ratio, result.simulation_time
    );
    println!("{}", sim.summary());

    let post = PostProcessor::new(&sim);
    let estimator = post.current_estimator()?;
    println!(
        "📈 I(t) = {:.4e} A · (1 - exp(-{:.4e} · t))",
        estimator.i_max(),
        estimator.rate()
    );
    println!("{:>14} {:>14} {:>14}", "time (s)", "current (A)", "fitted (A)");
    for point in post.sampled_curve(DATAPOINTS)? {
        println!("{:>14.4e} {:>14.4e} {:>14.4e}", point.time, point.current, point.fitted);
    }

    let csv_path = out_dir.join("tio2_hydrogen_curve.csv");
    post.write_csv(BufWriter::new(File::create(&csv_path)?))?;
    println!("💾 Curve written to {}", csv_path.display());

    let sim_path = out_dir.join(persistence::default_simulation_file_name());
    persistence::save_simulation(&sim, Some(sim_path.as_path()))?;
    println!("💾 Simulation saved to {}", sim_path.display());

    Ok(())
}
