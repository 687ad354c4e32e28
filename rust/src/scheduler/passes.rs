//! Forward and backward CPM passes.
//!
//! Each pass visits tasks in topological order (reversed for the backward
//! pass), so every task is resolved after all tasks it depends on and one pass
//! per direction suffices.

use crate::calendar::WorkMinutes;
use crate::graph::{Edge, TaskGraph};
use crate::interner::ArenaIdx;
use crate::models::{ConflictKind, ConstraintKind, DependencyType};

use super::state::{RawConflict, TaskTiming};

/// Lower bound a predecessor places on its successor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForwardBound {
    Start(WorkMinutes),
    Finish(WorkMinutes),
}

/// Bound on the successor's early dates implied by one incoming edge.
pub fn forward_bound(edge: &Edge, pred: &TaskTiming) -> ForwardBound {
    match edge.dependency_type {
        DependencyType::FinishToStart => ForwardBound::Start(pred.early_finish + edge.lag),
        DependencyType::StartToStart => ForwardBound::Start(pred.early_start + edge.lag),
        DependencyType::FinishToFinish => ForwardBound::Finish(pred.early_finish + edge.lag),
        DependencyType::StartToFinish => ForwardBound::Finish(pred.early_start + edge.lag),
    }
}

/// Upper bound on the predecessor's late finish implied by one outgoing edge.
pub fn backward_bound(edge: &Edge, succ: &TaskTiming, pred_duration: WorkMinutes) -> WorkMinutes {
    match edge.dependency_type {
        DependencyType::FinishToStart => succ.late_start - edge.lag,
        DependencyType::StartToStart => succ.late_start - edge.lag + pred_duration,
        DependencyType::FinishToFinish => succ.late_finish - edge.lag,
        DependencyType::StartToFinish => succ.late_finish - edge.lag + pred_duration,
    }
}

/// How far the predecessor can slip before the edge pushes the successor's early dates.
///
/// Zero means the edge is driving.
pub fn edge_slack(edge: &Edge, pred: &TaskTiming, succ: &TaskTiming) -> WorkMinutes {
    match forward_bound(edge, pred) {
        ForwardBound::Start(bound) => succ.early_start - bound,
        ForwardBound::Finish(bound) => succ.early_finish - bound,
    }
}

/// Earliest start the predecessors and the project start allow.
pub fn dependency_start_bound(
    graph: &TaskGraph,
    idx: ArenaIdx,
    timings: &[TaskTiming],
) -> WorkMinutes {
    let duration = graph.node(idx).duration;
    graph
        .predecessors(idx)
        .iter()
        .map(|edge| match forward_bound(edge, &timings[edge.task]) {
            ForwardBound::Start(start) => start,
            ForwardBound::Finish(finish) => finish - duration,
        })
        .fold(0, i64::max)
}

/// Inputs shared by both passes.
pub struct PassInputs<'a> {
    pub graph: &'a TaskGraph,
    /// Constraint dates as axis offsets, indexed by task.
    pub constraint_offsets: &'a [Option<WorkMinutes>],
    /// Extra start lower bounds (as-late-as-possible placement, leveling delays).
    pub start_floors: &'a [Option<WorkMinutes>],
}

/// Compute early dates of one task from its already-resolved predecessors.
///
/// Pinned constraints win over dependencies; the disagreement is pushed to
/// `conflicts`.
pub fn forward_task(
    inputs: &PassInputs<'_>,
    idx: ArenaIdx,
    timings: &mut [TaskTiming],
    conflicts: &mut Vec<RawConflict>,
) {
    let node = inputs.graph.node(idx);
    let duration = node.duration;
    let dep_bound = dependency_start_bound(inputs.graph, idx, timings);
    let constraint = inputs.constraint_offsets[idx];

    let mut start = dep_bound;
    match (node.constraint_kind, constraint) {
        (ConstraintKind::StartNoEarlierThan, Some(date)) => start = start.max(date),
        (ConstraintKind::FinishNoEarlierThan, Some(date)) => start = start.max(date - duration),
        (ConstraintKind::MustStartOn, Some(date)) => start = pin(idx, date, dep_bound, conflicts),
        (ConstraintKind::MustFinishOn, Some(date)) => {
            start = pin(idx, date - duration, dep_bound, conflicts)
        }
        // Only meaningful in the backward pass
        _ => {}
    }

    if !node.constraint_kind.is_pinned() {
        if let Some(floor) = inputs.start_floors[idx] {
            start = start.max(floor);
        }
    }

    timings[idx].early_start = start;
    timings[idx].early_finish = start + duration;
}

fn pin(
    idx: ArenaIdx,
    pinned_start: WorkMinutes,
    dep_bound: WorkMinutes,
    conflicts: &mut Vec<RawConflict>,
) -> WorkMinutes {
    if pinned_start < dep_bound {
        conflicts.push(RawConflict {
            task: idx,
            kind: ConflictKind::PinnedBeforeDependencies,
            deviation: dep_bound - pinned_start,
        });
    }
    pinned_start
}

/// Forward pass over all non-summary tasks. Returns the constraint conflicts found.
pub fn forward_pass(inputs: &PassInputs<'_>, timings: &mut [TaskTiming]) -> Vec<RawConflict> {
    let mut conflicts = Vec::new();
    for &idx in inputs.graph.topo_order() {
        forward_task(inputs, idx, timings, &mut conflicts);
    }
    conflicts
}

/// Backward pass from `required_finish` over all non-summary tasks.
pub fn backward_pass(
    inputs: &PassInputs<'_>,
    required_finish: WorkMinutes,
    timings: &mut [TaskTiming],
) {
    for &idx in inputs.graph.topo_order().iter().rev() {
        let node = inputs.graph.node(idx);
        let duration = node.duration;

        let mut finish = inputs
            .graph
            .successors(idx)
            .iter()
            .map(|edge| backward_bound(edge, &timings[edge.task], duration))
            .fold(required_finish, i64::min);

        match (node.constraint_kind, inputs.constraint_offsets[idx]) {
            (ConstraintKind::FinishNoLaterThan, Some(date)) => finish = finish.min(date),
            (ConstraintKind::StartNoLaterThan, Some(date)) => finish = finish.min(date + duration),
            (ConstraintKind::MustFinishOn, Some(date)) => finish = date,
            (ConstraintKind::MustStartOn, Some(date)) => finish = date + duration,
            _ => {}
        }

        timings[idx].late_finish = finish;
        timings[idx].late_start = finish - duration;
    }
}
