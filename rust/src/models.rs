//! Core data types for the scheduling engine.
//!
//! Inputs are an immutable project snapshot supplied by the caller; outputs
//! are created fresh on every invocation.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use pyo3::prelude::*;
use std::collections::HashMap;

// Note: We use std HashMap here for PyO3 interface compatibility

/// Kind of a task node.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Task,
    Milestone,
    Summary,
}

/// Date constraint policy of a task.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    AsSoonAsPossible,
    AsLateAsPossible,
    MustStartOn,
    MustFinishOn,
    StartNoEarlierThan,
    StartNoLaterThan,
    FinishNoEarlierThan,
    FinishNoLaterThan,
}

impl ConstraintKind {
    /// Whether the constraint is meaningless without a constraint date.
    pub fn requires_date(self) -> bool {
        !matches!(self, Self::AsSoonAsPossible | Self::AsLateAsPossible)
    }

    /// Hard date commitments that pin the task outright.
    pub fn is_pinned(self) -> bool {
        matches!(self, Self::MustStartOn | Self::MustFinishOn)
    }

    /// Whether the constraint date refers to the task's finish.
    pub fn anchors_finish(self) -> bool {
        matches!(
            self,
            Self::MustFinishOn | Self::FinishNoEarlierThan | Self::FinishNoLaterThan
        )
    }
}

/// Dependency semantics between predecessor and successor.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DependencyType {
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

/// Reason a task carries a constraint-conflict warning.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConflictKind {
    /// A must-start-on / must-finish-on date is earlier than its dependencies allow.
    PinnedBeforeDependencies,
    /// Dependencies push the start past a start-no-later-than date.
    StartNoLaterThanViolated,
    /// Dependencies push the finish past a finish-no-later-than date.
    FinishNoLaterThanViolated,
    /// The task finishes after the explicit project deadline.
    ProjectDeadline,
}

/// A task to be scheduled.
#[pyclass]
#[derive(Clone, Debug)]
pub struct Task {
    #[pyo3(get, set)]
    pub id: String,
    /// Work quantity in working days. Ignored for milestones and summaries.
    #[pyo3(get, set)]
    pub duration_days: f64,
    #[pyo3(get, set)]
    pub kind: TaskKind,
    #[pyo3(get, set)]
    pub constraint_kind: ConstraintKind,
    #[pyo3(get, set)]
    pub constraint_date: Option<NaiveDate>,
    #[pyo3(get, set)]
    pub parent_id: Option<String>,
}

#[pymethods]
impl Task {
    #[new]
    #[pyo3(signature = (
        id,
        duration_days,
        kind=TaskKind::Task,
        constraint_kind=ConstraintKind::AsSoonAsPossible,
        constraint_date=None,
        parent_id=None
    ))]
    pub fn new(
        id: String,
        duration_days: f64,
        kind: TaskKind,
        constraint_kind: ConstraintKind,
        constraint_date: Option<NaiveDate>,
        parent_id: Option<String>,
    ) -> Self {
        Self {
            id,
            duration_days,
            kind,
            constraint_kind,
            constraint_date,
            parent_id,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Task(id={:?}, duration_days={}, kind={:?}, constraint={:?})",
            self.id, self.duration_days, self.kind, self.constraint_kind
        )
    }
}

/// A typed, lagged edge between two tasks.
#[pyclass]
#[derive(Clone, Debug)]
pub struct Dependency {
    #[pyo3(get, set)]
    pub predecessor_id: String,
    #[pyo3(get, set)]
    pub successor_id: String,
    #[pyo3(get, set)]
    pub dependency_type: DependencyType,
    /// Working days; negative values are leads.
    #[pyo3(get, set)]
    pub lag_days: f64,
}

#[pymethods]
impl Dependency {
    #[new]
    #[pyo3(signature = (predecessor_id, successor_id, dependency_type=DependencyType::FinishToStart, lag_days=0.0))]
    pub fn new(
        predecessor_id: String,
        successor_id: String,
        dependency_type: DependencyType,
        lag_days: f64,
    ) -> Self {
        Self {
            predecessor_id,
            successor_id,
            dependency_type,
            lag_days,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Dependency({:?} -> {:?}, type={:?}, lag_days={})",
            self.predecessor_id, self.successor_id, self.dependency_type, self.lag_days
        )
    }
}

/// A resource working on a task at some allocation percentage.
#[pyclass]
#[derive(Clone, Debug)]
pub struct ResourceAssignment {
    #[pyo3(get, set)]
    pub task_id: String,
    #[pyo3(get, set)]
    pub resource_id: String,
    #[pyo3(get, set)]
    pub allocation_percent: f64,
    /// First day the assignment applies (inclusive).
    #[pyo3(get, set)]
    pub window_start: Option<NaiveDate>,
    /// Last day the assignment applies (inclusive).
    #[pyo3(get, set)]
    pub window_end: Option<NaiveDate>,
}

#[pymethods]
impl ResourceAssignment {
    #[new]
    #[pyo3(signature = (task_id, resource_id, allocation_percent=100.0, window_start=None, window_end=None))]
    pub fn new(
        task_id: String,
        resource_id: String,
        allocation_percent: f64,
        window_start: Option<NaiveDate>,
        window_end: Option<NaiveDate>,
    ) -> Self {
        Self {
            task_id,
            resource_id,
            allocation_percent,
            window_start,
            window_end,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "ResourceAssignment(task_id={:?}, resource_id={:?}, allocation={}%)",
            self.task_id, self.resource_id, self.allocation_percent
        )
    }
}

impl ResourceAssignment {
    /// Whether the assignment's date window covers `date`.
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        self.window_start.map_or(true, |s| date >= s) && self.window_end.map_or(true, |e| date <= e)
    }
}

/// Working-time definition for the project or a single resource.
#[pyclass]
#[derive(Clone, Debug)]
pub struct Calendar {
    #[pyo3(get, set)]
    pub id: String,
    /// ISO weekday numbers (1 = Monday .. 7 = Sunday).
    #[pyo3(get, set)]
    pub working_weekdays: Vec<u32>,
    #[pyo3(get, set)]
    pub hours_per_day: f64,
    /// Time of day the working block begins.
    #[pyo3(get, set)]
    pub day_start: NaiveTime,
    #[pyo3(get, set)]
    pub holidays: Vec<NaiveDate>,
    /// Inclusive (first, last) day ranges off work.
    #[pyo3(get, set)]
    pub time_off: Vec<(NaiveDate, NaiveDate)>,
}

/// Default working block start (09:00).
pub fn default_day_start() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

impl Default for Calendar {
    fn default() -> Self {
        Self {
            id: "standard".to_string(),
            working_weekdays: vec![1, 2, 3, 4, 5],
            hours_per_day: 8.0,
            day_start: default_day_start(),
            holidays: Vec::new(),
            time_off: Vec::new(),
        }
    }
}

#[pymethods]
impl Calendar {
    #[new]
    #[pyo3(signature = (
        id,
        working_weekdays=None,
        hours_per_day=8.0,
        day_start=None,
        holidays=None,
        time_off=None
    ))]
    pub fn new(
        id: String,
        working_weekdays: Option<Vec<u32>>,
        hours_per_day: f64,
        day_start: Option<NaiveTime>,
        holidays: Option<Vec<NaiveDate>>,
        time_off: Option<Vec<(NaiveDate, NaiveDate)>>,
    ) -> Self {
        Self {
            id,
            working_weekdays: working_weekdays.unwrap_or_else(|| vec![1, 2, 3, 4, 5]),
            hours_per_day,
            day_start: day_start.unwrap_or_else(default_day_start),
            holidays: holidays.unwrap_or_default(),
            time_off: time_off.unwrap_or_default(),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Calendar(id={:?}, weekdays={:?}, hours_per_day={}, holidays={})",
            self.id,
            self.working_weekdays,
            self.hours_per_day,
            self.holidays.len()
        )
    }
}

/// Capacity and working time of one resource.
#[pyclass]
#[derive(Clone, Debug)]
pub struct ResourceCalendar {
    #[pyo3(get, set)]
    pub resource_id: String,
    /// Falls back to the project calendar when absent.
    #[pyo3(get, set)]
    pub calendar: Option<Calendar>,
    #[pyo3(get, set)]
    pub max_capacity_percent: f64,
}

#[pymethods]
impl ResourceCalendar {
    #[new]
    #[pyo3(signature = (resource_id, calendar=None, max_capacity_percent=100.0))]
    pub fn new(resource_id: String, calendar: Option<Calendar>, max_capacity_percent: f64) -> Self {
        Self {
            resource_id,
            calendar,
            max_capacity_percent,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "ResourceCalendar(resource_id={:?}, capacity={}%)",
            self.resource_id, self.max_capacity_percent
        )
    }
}

/// Everything one computation needs, read-only for its duration.
#[pyclass]
#[derive(Clone, Debug)]
pub struct ProjectSnapshot {
    #[pyo3(get, set)]
    pub tasks: Vec<Task>,
    #[pyo3(get, set)]
    pub dependencies: Vec<Dependency>,
    #[pyo3(get, set)]
    pub assignments: Vec<ResourceAssignment>,
    #[pyo3(get, set)]
    pub resource_calendars: Vec<ResourceCalendar>,
    #[pyo3(get, set)]
    pub calendar: Calendar,
    #[pyo3(get, set)]
    pub project_start: NaiveDate,
    #[pyo3(get, set)]
    pub deadline: Option<NaiveDate>,
}

#[pymethods]
impl ProjectSnapshot {
    #[new]
    #[pyo3(signature = (
        tasks,
        dependencies,
        project_start,
        calendar=None,
        assignments=None,
        resource_calendars=None,
        deadline=None
    ))]
    pub fn new(
        tasks: Vec<Task>,
        dependencies: Vec<Dependency>,
        project_start: NaiveDate,
        calendar: Option<Calendar>,
        assignments: Option<Vec<ResourceAssignment>>,
        resource_calendars: Option<Vec<ResourceCalendar>>,
        deadline: Option<NaiveDate>,
    ) -> Self {
        Self {
            tasks,
            dependencies,
            assignments: assignments.unwrap_or_default(),
            resource_calendars: resource_calendars.unwrap_or_default(),
            calendar: calendar.unwrap_or_default(),
            project_start,
            deadline,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "ProjectSnapshot(tasks={}, dependencies={}, assignments={}, start={})",
            self.tasks.len(),
            self.dependencies.len(),
            self.assignments.len(),
            self.project_start
        )
    }
}

/// A recorded, non-fatal conflict between a date constraint and the computed dates.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintConflict {
    #[pyo3(get)]
    pub task_id: String,
    #[pyo3(get)]
    pub kind: ConflictKind,
    #[pyo3(get)]
    pub constraint_date: Option<NaiveDate>,
    /// How far the dates disagree, in working days.
    #[pyo3(get)]
    pub deviation_days: f64,
    #[pyo3(get)]
    pub message: String,
}

#[pymethods]
impl ConstraintConflict {
    fn __repr__(&self) -> String {
        format!(
            "ConstraintConflict(task_id={:?}, kind={:?}, deviation_days={})",
            self.task_id, self.kind, self.deviation_days
        )
    }
}

/// Computed dates for one task.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleEntry {
    #[pyo3(get)]
    pub task_id: String,
    #[pyo3(get)]
    pub kind: TaskKind,
    #[pyo3(get)]
    pub early_start: NaiveDateTime,
    #[pyo3(get)]
    pub early_finish: NaiveDateTime,
    #[pyo3(get)]
    pub late_start: NaiveDateTime,
    #[pyo3(get)]
    pub late_finish: NaiveDateTime,
    /// Offsets from the project start, in working days.
    #[pyo3(get)]
    pub early_start_days: f64,
    #[pyo3(get)]
    pub early_finish_days: f64,
    #[pyo3(get)]
    pub late_start_days: f64,
    #[pyo3(get)]
    pub late_finish_days: f64,
    #[pyo3(get)]
    pub total_float_days: f64,
    #[pyo3(get)]
    pub free_float_days: f64,
    #[pyo3(get)]
    pub critical: bool,
    #[pyo3(get)]
    pub conflicts: Vec<ConstraintConflict>,
}

#[pymethods]
impl ScheduleEntry {
    fn __repr__(&self) -> String {
        format!(
            "ScheduleEntry(task_id={:?}, early={}..{}, float={}, critical={})",
            self.task_id,
            self.early_start_days,
            self.early_finish_days,
            self.total_float_days,
            self.critical
        )
    }
}

/// Result of a forward/backward scheduling run.
#[pyclass]
#[derive(Clone, Debug)]
pub struct Schedule {
    /// One entry per task, in input order.
    #[pyo3(get)]
    pub entries: Vec<ScheduleEntry>,
    /// All constraint conflicts across tasks.
    #[pyo3(get)]
    pub conflicts: Vec<ConstraintConflict>,
    #[pyo3(get)]
    pub project_start: NaiveDateTime,
    #[pyo3(get)]
    pub project_finish: NaiveDateTime,
    #[pyo3(get)]
    pub project_duration_days: f64,
    #[pyo3(get)]
    pub metadata: HashMap<String, String>,
}

#[pymethods]
impl Schedule {
    /// Look up the entry of a task by id.
    pub fn get_entry(&self, task_id: &str) -> Option<ScheduleEntry> {
        self.entry(task_id).cloned()
    }

    fn __repr__(&self) -> String {
        format!(
            "Schedule(entries={}, conflicts={}, duration_days={})",
            self.entries.len(),
            self.conflicts.len(),
            self.project_duration_days
        )
    }
}

impl Schedule {
    pub fn entry(&self, task_id: &str) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|e| e.task_id == task_id)
    }

    /// "Here is a schedule, with N warnings."
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// A non-critical task whose float is within the near-critical threshold.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct NearCriticalTask {
    #[pyo3(get)]
    pub task_id: String,
    #[pyo3(get)]
    pub total_float_days: f64,
}

/// Critical paths and near-critical tasks of a schedule.
#[pyclass]
#[derive(Clone, Debug)]
pub struct CriticalPathReport {
    /// Ordered task-id sequences, source to sink.
    #[pyo3(get)]
    pub paths: Vec<Vec<String>>,
    #[pyo3(get)]
    pub critical_task_ids: Vec<String>,
    #[pyo3(get)]
    pub near_critical: Vec<NearCriticalTask>,
    #[pyo3(get)]
    pub project_duration_days: f64,
    #[pyo3(get)]
    pub project_finish: NaiveDateTime,
    /// True when enumeration stopped at `max_critical_paths`.
    #[pyo3(get)]
    pub truncated: bool,
}

#[pymethods]
impl CriticalPathReport {
    fn __repr__(&self) -> String {
        format!(
            "CriticalPathReport(paths={}, critical={}, near_critical={})",
            self.paths.len(),
            self.critical_task_ids.len(),
            self.near_critical.len()
        )
    }
}

/// Load of one resource on one day.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceDay {
    #[pyo3(get)]
    pub date: NaiveDate,
    #[pyo3(get)]
    pub allocated_percent: f64,
    #[pyo3(get)]
    pub capacity_percent: f64,
    #[pyo3(get)]
    pub over_allocated: bool,
}

/// Day-by-day load of one resource.
#[pyclass]
#[derive(Clone, Debug)]
pub struct ResourceAllocation {
    #[pyo3(get)]
    pub resource_id: String,
    #[pyo3(get)]
    pub days: Vec<ResourceDay>,
}

#[pymethods]
impl ResourceAllocation {
    fn __repr__(&self) -> String {
        let over = self.days.iter().filter(|d| d.over_allocated).count();
        format!(
            "ResourceAllocation(resource_id={:?}, days={}, over_allocated={})",
            self.resource_id,
            self.days.len(),
            over
        )
    }
}

/// Over-allocation that leveling could not remove.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct LevelingConflict {
    #[pyo3(get)]
    pub resource_id: String,
    #[pyo3(get)]
    pub date: NaiveDate,
    /// Allocation above capacity, in percent.
    #[pyo3(get)]
    pub deficit_percent: f64,
    /// Tasks loading the resource on that day.
    #[pyo3(get)]
    pub task_ids: Vec<String>,
}

#[pymethods]
impl LevelingConflict {
    fn __repr__(&self) -> String {
        format!(
            "LevelingConflict(resource_id={:?}, date={}, deficit={}%)",
            self.resource_id, self.date, self.deficit_percent
        )
    }
}

/// A delay applied to a task by leveling.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct TaskShift {
    #[pyo3(get)]
    pub task_id: String,
    #[pyo3(get)]
    pub delay_days: f64,
    #[pyo3(get)]
    pub from_start: NaiveDateTime,
    #[pyo3(get)]
    pub to_start: NaiveDateTime,
}

/// Revised schedule produced by resource leveling.
#[pyclass]
#[derive(Clone, Debug)]
pub struct LevelingResult {
    #[pyo3(get)]
    pub schedule: Schedule,
    #[pyo3(get)]
    pub allocations: Vec<ResourceAllocation>,
    #[pyo3(get)]
    pub conflicts: Vec<LevelingConflict>,
    #[pyo3(get)]
    pub shifts: Vec<TaskShift>,
}

#[pymethods]
impl LevelingResult {
    /// Whether every over-allocation was removed.
    pub fn is_fully_leveled(&self) -> bool {
        self.conflicts.is_empty()
    }

    fn __repr__(&self) -> String {
        format!(
            "LevelingResult(shifts={}, unresolved={})",
            self.shifts.len(),
            self.conflicts.len()
        )
    }
}

/// Everything a full engine run produces.
#[pyclass]
#[derive(Clone, Debug)]
pub struct EngineOutput {
    #[pyo3(get)]
    pub schedule: Schedule,
    #[pyo3(get)]
    pub critical_path: CriticalPathReport,
    /// Present when leveling was enabled.
    #[pyo3(get)]
    pub leveling: Option<LevelingResult>,
}

#[pymethods]
impl EngineOutput {
    fn __repr__(&self) -> String {
        format!(
            "EngineOutput(entries={}, critical_paths={}, leveled={})",
            self.schedule.entries.len(),
            self.critical_path.paths.len(),
            self.leveling.is_some()
        )
    }
}
