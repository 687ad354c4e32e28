//! Structural errors that make a schedule impossible to compute.
//!
//! Constraint and leveling conflicts are not errors: they travel inside
//! successful results (see `models::ConstraintConflict` and
//! `models::LevelingConflict`).

use thiserror::Error;

/// Errors that abort a scheduling computation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Circular dependency detected between tasks: {}", task_ids.join(", "))]
    CircularDependency { task_ids: Vec<String> },
    #[error("Dependency {predecessor} -> {successor} references unknown task {missing}")]
    DanglingDependency {
        predecessor: String,
        successor: String,
        missing: String,
    },
    #[error("Duplicate task id: {0}")]
    DuplicateTask(String),
    #[error("Task {task_id} references unknown parent {parent_id}")]
    UnknownParent { task_id: String, parent_id: String },
    #[error("Task {task_id} has parent {parent_id}, which is not a summary task")]
    InvalidParent { task_id: String, parent_id: String },
    #[error("Circular parent hierarchy involving task {0}")]
    CircularHierarchy(String),
    #[error("Task {task_id} has invalid duration {duration_days}")]
    InvalidDuration { task_id: String, duration_days: f64 },
    #[error("Dependency {predecessor} -> {successor} has invalid lag {lag_days}")]
    InvalidLag {
        predecessor: String,
        successor: String,
        lag_days: f64,
    },
    #[error("Dependency {predecessor} -> {successor} references summary {summary_id}, which has no tasks")]
    EmptySummaryDependency {
        predecessor: String,
        successor: String,
        summary_id: String,
    },
    #[error("Task {0} has a date constraint without a constraint date")]
    MissingConstraintDate(String),
    #[error("Resource assignment {resource_id} references unknown task {task_id}")]
    UnknownAssignmentTask {
        task_id: String,
        resource_id: String,
    },
    #[error("Invalid allocation {allocation_percent}% for resource {resource_id} on task {task_id}")]
    InvalidAllocation {
        task_id: String,
        resource_id: String,
        allocation_percent: f64,
    },
    #[error("Invalid calendar {calendar_id}: {reason}")]
    InvalidCalendar { calendar_id: String, reason: String },
    #[error("Calendar {calendar_id} has no working time")]
    NoWorkingTime { calendar_id: String },
    #[error("Negative working duration: {0} minutes")]
    NegativeDuration(i64),
}
