// Physical constants (SI units)
pub const AVOGADRO: f64 = 6.0221409e23; // 1/mol
pub const GAS_CONSTANT: f64 = 8.314; // J/(mol·K)
pub const BOLTZMANN: f64 = 1.380649e-23; // J/K
pub const ELEMENTARY_CHARGE: f64 = 1.6021e-19; // C

// Maxwell–Boltzmann sampling table
pub const VELOCITY_SAMPLES: usize = 100;
pub const VELOCITY_SPAN_FACTOR: f64 = 3.0; // table spans [0, 3 × mean thermal speed]

// default run settings:
pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 0.8;
pub const DEFAULT_MAX_ITERATIONS: u64 = 1_000_000;
pub const DEFAULT_PROGRESS_INTERVAL_PERCENT: f64 = 10.0;

// Reference laboratory conditions
pub const ROOM_TEMPERATURE_K: f64 = 298.0;
pub const ATMOSPHERIC_PRESSURE_PA: f64 = 101_325.0;

// Persisted simulations
pub const SIMULATION_FILE_EXTENSION: &str = "carlo";
