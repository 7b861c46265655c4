use crate::sim::GasSensorSimulation;
use crate::sim::sim_op::{SimOp, SimOpHandle};

/// Percentage of the way from `start_ratio` down to `target_ratio`.
///
/// Clamped to `[0, 100]`; a target at or above the start counts as done.
pub fn progress_percent(start_ratio: f64, current_ratio: f64, target_ratio: f64) -> f64 {
    let total_remained = start_ratio - target_ratio;
    if total_remained <= 0.0 {
        return 100.0;
    }
    let remained = current_ratio - target_ratio;
    ((total_remained - remained) * 100.0 / total_remained).clamp(0.0, 100.0)
}

/// Progress Reporter Operator
///
/// Logs how far the active cell ratio has moved toward the run's threshold,
/// once per `report_interval_percent` milestone. The reported percentage
/// never goes backwards.
#[derive(Debug, Clone)]
pub struct ProgressReporterOp {
    pub name: String,
    pub report_interval_percent: f64,
    start_ratio: f64,
    percent: f64,
    next_milestone: f64,
    reports: usize,
}

impl ProgressReporterOp {
    pub fn new(report_interval_percent: f64) -> Self {
        Self {
            name: "ProgressReporterOp".to_string(),
            report_interval_percent: report_interval_percent.max(f64::EPSILON),
            start_ratio: 1.0,
            percent: 0.0,
            next_milestone: 0.0,
            reports: 0,
        }
    }

    pub fn handle(report_interval_percent: f64) -> SimOpHandle {
        SimOpHandle::new(Box::new(Self::new(report_interval_percent)))
    }

    /// Last computed progress, 0–100.
    pub fn percent(&self) -> f64 {
        self.percent
    }

    /// Number of milestone lines logged so far.
    pub fn reports(&self) -> usize {
        self.reports
    }

    fn observe(&mut self, sim: &GasSensorSimulation) {
        let Some(target) = sim.target_ratio() else {
            return;
        };
        let percent = progress_percent(self.start_ratio, sim.active_cell_ratio(), target);
        self.percent = self.percent.max(percent);
    }

    fn advance_milestone(&mut self) {
        let interval = self.report_interval_percent;
        self.next_milestone = ((self.percent / interval).floor() + 1.0) * interval;
        self.reports += 1;
    }
}

impl SimOp for ProgressReporterOp {
    fn name(&self) -> &str {
        &self.name
    }

    fn init_sim(&mut self, sim: &GasSensorSimulation) {
        self.start_ratio = sim.active_cell_ratio();
        self.percent = 0.0;
        self.next_milestone = 0.0;
        self.reports = 0;
        log::info!(
            "{}: solving... ACR {:.2e}, ITR {:07}",
            sim.name,
            self.start_ratio,
            sim.iterations()
        );
    }

    fn update_sim(&mut self, sim: &GasSensorSimulation) {
        self.observe(sim);
        if self.percent >= self.next_milestone {
            log::info!(
                "{}: {:>5.1}% ACR {:.2e}, ITR {:07}",
                sim.name,
                self.percent,
                sim.active_cell_ratio(),
                sim.iterations()
            );
            self.advance_milestone();
        }
    }

    fn after_sim(&mut self, sim: &GasSensorSimulation) {
        let converged = sim.target_ratio().is_some_and(|target| sim.is_converged(target));
        if converged {
            self.percent = 100.0;
            log::info!("{}: solution converged after {} iterations", sim.name, sim.iterations());
        } else {
            log::warn!(
                "{}: stopped at {:.1}% after {} iterations",
                sim.name,
                self.percent,
                sim.iterations()
            );
        }
    }
}
