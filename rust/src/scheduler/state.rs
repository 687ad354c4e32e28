//! Per-task timing arena produced by the scheduling passes.

use crate::calendar::WorkMinutes;
use crate::interner::ArenaIdx;
use crate::models::ConflictKind;

/// Early and late dates of one task, as offsets on the project work axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskTiming {
    pub early_start: WorkMinutes,
    pub early_finish: WorkMinutes,
    pub late_start: WorkMinutes,
    pub late_finish: WorkMinutes,
}

impl TaskTiming {
    /// Total float = late start - early start.
    pub fn total_float(&self) -> WorkMinutes {
        self.late_start - self.early_start
    }
}

/// A constraint conflict before it is rendered for the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawConflict {
    pub task: ArenaIdx,
    pub kind: ConflictKind,
    /// Working minutes by which the dates disagree.
    pub deviation: WorkMinutes,
}

/// Result of the forward/backward passes over one snapshot.
///
/// Cloned, never mutated in place, when leveling derives a revised schedule.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleState {
    /// Indexed by task; summaries hold rolled-up dates.
    pub timings: Vec<TaskTiming>,
    /// Indexed by task; summaries hold the minimum over descendants.
    pub total_float: Vec<WorkMinutes>,
    pub free_float: Vec<WorkMinutes>,
    pub critical: Vec<bool>,
    /// Finish the backward pass started from.
    pub required_finish: WorkMinutes,
    /// Latest early finish of any task.
    pub project_finish: WorkMinutes,
    pub conflicts: Vec<RawConflict>,
    /// Whether as-late-as-possible tasks forced a refinement pass.
    pub alap_refined: bool,
}

impl ScheduleState {
    pub fn new(task_count: usize) -> Self {
        Self {
            timings: vec![TaskTiming::default(); task_count],
            total_float: vec![0; task_count],
            free_float: vec![0; task_count],
            critical: vec![false; task_count],
            required_finish: 0,
            project_finish: 0,
            conflicts: Vec::new(),
            alap_refined: false,
        }
    }

    pub fn conflicts_for(&self, task: ArenaIdx) -> impl Iterator<Item = &RawConflict> {
        self.conflicts.iter().filter(move |c| c.task == task)
    }
}
