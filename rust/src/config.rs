//! Configuration types for the scheduling engine.

use pyo3::prelude::*;

/// Tuning knobs for one engine invocation.
#[pyclass]
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Tasks with total float at or below this (working days) are critical.
    #[pyo3(get, set)]
    pub critical_tolerance_days: f64,
    /// Non-critical tasks with float at or below this (working days) are near-critical.
    #[pyo3(get, set)]
    pub near_critical_threshold_days: f64,
    /// Upper bound on enumerated critical paths.
    #[pyo3(get, set)]
    pub max_critical_paths: usize,
    /// Whether `run` performs resource leveling after scheduling.
    #[pyo3(get, set)]
    pub level_resources: bool,
    /// How many consecutive non-working days a calendar scan may cross before failing.
    #[pyo3(get, set)]
    pub max_calendar_scan_days: u32,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            critical_tolerance_days: 1e-6,
            near_critical_threshold_days: 2.0,
            max_critical_paths: 64,
            level_resources: true,
            max_calendar_scan_days: 3660,
            verbosity: 0,
        }
    }
}

#[pymethods]
impl EngineConfig {
    #[new]
    #[pyo3(signature = (
        critical_tolerance_days=None,
        near_critical_threshold_days=None,
        max_critical_paths=None,
        level_resources=None,
        max_calendar_scan_days=None,
        verbosity=None
    ))]
    fn new(
        critical_tolerance_days: Option<f64>,
        near_critical_threshold_days: Option<f64>,
        max_critical_paths: Option<usize>,
        level_resources: Option<bool>,
        max_calendar_scan_days: Option<u32>,
        verbosity: Option<u8>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            critical_tolerance_days: critical_tolerance_days
                .unwrap_or(defaults.critical_tolerance_days),
            near_critical_threshold_days: near_critical_threshold_days
                .unwrap_or(defaults.near_critical_threshold_days),
            max_critical_paths: max_critical_paths.unwrap_or(defaults.max_critical_paths),
            level_resources: level_resources.unwrap_or(defaults.level_resources),
            max_calendar_scan_days: max_calendar_scan_days
                .unwrap_or(defaults.max_calendar_scan_days),
            verbosity: verbosity.unwrap_or(defaults.verbosity),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "EngineConfig(critical_tolerance_days={}, near_critical_threshold_days={}, level_resources={})",
            self.critical_tolerance_days, self.near_critical_threshold_days, self.level_resources
        )
    }
}
