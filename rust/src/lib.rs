//! Calendar-aware project scheduling engine.
//!
//! Computes CPM early/late dates and float over typed, lagged dependencies,
//! extracts critical paths and levels resource over-allocation. Exposed to
//! Python through PyO3; the same types are usable directly from Rust.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::prelude::*;

pub mod calendar;
mod config;
pub mod critical_path;
mod engine;
mod error;
pub mod graph;
pub mod interner;
pub mod leveling;
pub mod logging;
mod models;
pub mod scheduler;

pub use calendar::{WorkAxis, WorkMinutes, WorkingCalendar};
pub use config::EngineConfig;
pub use engine::SchedulingEngine;
pub use error::EngineError;
pub use graph::TaskGraph;
pub use models::{
    Calendar, ConflictKind, ConstraintConflict, ConstraintKind, CriticalPathReport, Dependency,
    DependencyType, EngineOutput, LevelingConflict, LevelingResult, NearCriticalTask,
    ProjectSnapshot, ResourceAllocation, ResourceAssignment, ResourceCalendar, ResourceDay,
    Schedule, ScheduleEntry, Task, TaskKind, TaskShift,
};

fn build_engine(
    project: &ProjectSnapshot,
    config: Option<EngineConfig>,
) -> PyResult<SchedulingEngine> {
    let config = config.unwrap_or_default();
    SchedulingEngine::new(project, &config).map_err(to_py_err)
}

fn to_py_err(e: EngineError) -> PyErr {
    pyo3::exceptions::PyValueError::new_err(e.to_string())
}

/// Compute early/late dates, float and constraint conflicts.
///
/// # Raises
/// * ValueError on structural errors (cycles, dangling references, calendars
///   without working time, invalid assignments)
#[pyfunction]
#[pyo3(signature = (project, config=None))]
fn compute_schedule(project: ProjectSnapshot, config: Option<EngineConfig>) -> PyResult<Schedule> {
    build_engine(&project, config)?.schedule().map_err(to_py_err)
}

/// Critical paths and near-critical tasks of the unleveled schedule.
#[pyfunction]
#[pyo3(signature = (project, config=None))]
fn analyze_critical_path(
    project: ProjectSnapshot,
    config: Option<EngineConfig>,
) -> PyResult<CriticalPathReport> {
    build_engine(&project, config)?
        .critical_path()
        .map_err(to_py_err)
}

/// Level resource over-allocation within task float.
///
/// Unresolved over-allocation is returned in `LevelingResult.conflicts`,
/// never raised.
#[pyfunction]
#[pyo3(signature = (project, config=None))]
fn level_resources(
    project: ProjectSnapshot,
    config: Option<EngineConfig>,
) -> PyResult<LevelingResult> {
    build_engine(&project, config)?.level().map_err(to_py_err)
}

/// Schedule, critical path and leveling in one call.
#[pyfunction]
#[pyo3(signature = (project, config=None))]
fn run_engine(project: ProjectSnapshot, config: Option<EngineConfig>) -> PyResult<EngineOutput> {
    build_engine(&project, config)?.run().map_err(to_py_err)
}

/// The portfolio_scheduler Python module.
#[pymodule]
fn portfolio_scheduler(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Enums
    m.add_class::<TaskKind>()?;
    m.add_class::<ConstraintKind>()?;
    m.add_class::<DependencyType>()?;
    m.add_class::<ConflictKind>()?;

    // Inputs
    m.add_class::<Task>()?;
    m.add_class::<Dependency>()?;
    m.add_class::<ResourceAssignment>()?;
    m.add_class::<Calendar>()?;
    m.add_class::<ResourceCalendar>()?;
    m.add_class::<ProjectSnapshot>()?;
    m.add_class::<EngineConfig>()?;

    // Outputs
    m.add_class::<ConstraintConflict>()?;
    m.add_class::<ScheduleEntry>()?;
    m.add_class::<Schedule>()?;
    m.add_class::<NearCriticalTask>()?;
    m.add_class::<CriticalPathReport>()?;
    m.add_class::<ResourceDay>()?;
    m.add_class::<ResourceAllocation>()?;
    m.add_class::<LevelingConflict>()?;
    m.add_class::<TaskShift>()?;
    m.add_class::<LevelingResult>()?;
    m.add_class::<EngineOutput>()?;

    // Algorithms
    m.add_function(wrap_pyfunction!(compute_schedule, m)?)?;
    m.add_function(wrap_pyfunction!(analyze_critical_path, m)?)?;
    m.add_function(wrap_pyfunction!(level_resources, m)?)?;
    m.add_function(wrap_pyfunction!(run_engine, m)?)?;

    Ok(())
}
