//! Forward/backward scheduler: runs the CPM passes, resolves constraints,
//! rolls up summaries and renders calendar dates.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::calendar::{WorkAxis, WorkMinutes};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::graph::TaskGraph;
use crate::interner::ArenaIdx;
use crate::models::{
    ConflictKind, ConstraintConflict, ConstraintKind, Schedule, ScheduleEntry, TaskKind,
};
use crate::{log_changes, log_debug};

use super::passes::{backward_pass, edge_slack, forward_pass, PassInputs};
use super::state::{RawConflict, ScheduleState, TaskTiming};

/// Computes early/late dates, float and constraint conflicts for one snapshot.
pub struct ForwardBackwardScheduler<'a> {
    graph: &'a TaskGraph,
    axis: &'a WorkAxis,
    config: &'a EngineConfig,
    deadline: Option<NaiveDate>,
    deadline_offset: Option<WorkMinutes>,
    constraint_offsets: Vec<Option<WorkMinutes>>,
}

impl<'a> ForwardBackwardScheduler<'a> {
    pub fn new(
        graph: &'a TaskGraph,
        axis: &'a WorkAxis,
        deadline: Option<NaiveDate>,
        config: &'a EngineConfig,
    ) -> Self {
        let constraint_offsets = (0..graph.len())
            .map(|idx| {
                let node = graph.node(idx);
                if node.kind == TaskKind::Summary || !node.constraint_kind.requires_date() {
                    return None;
                }
                node.constraint_date.map(|date| {
                    if node.constraint_kind.anchors_finish() {
                        axis.offset_of_finish_date(date)
                    } else {
                        axis.offset_of_start_date(date)
                    }
                })
            })
            .collect();

        Self {
            graph,
            axis,
            config,
            deadline,
            deadline_offset: deadline.map(|d| axis.offset_of_finish_date(d)),
            constraint_offsets,
        }
    }

    pub fn graph(&self) -> &TaskGraph {
        self.graph
    }

    pub fn axis(&self) -> &WorkAxis {
        self.axis
    }

    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    /// Run both passes with no extra start floors.
    pub fn compute(&self) -> ScheduleState {
        self.compute_with_floors(&vec![None; self.graph.len()])
    }

    /// Run both passes, treating `start_floors` as additional start lower bounds.
    ///
    /// As-late-as-possible tasks are placed at their late start by a second
    /// forward pass, after which the backward pass is repeated so early and late
    /// dates stay mutually consistent.
    pub fn compute_with_floors(&self, start_floors: &[Option<WorkMinutes>]) -> ScheduleState {
        let verbosity = self.config.verbosity;
        let mut state = ScheduleState::new(self.graph.len());
        let inputs = PassInputs {
            graph: self.graph,
            constraint_offsets: &self.constraint_offsets,
            start_floors,
        };

        let mut conflicts = forward_pass(&inputs, &mut state.timings);
        let project_finish = self.latest_early_finish(&state.timings);
        let required_finish = self.deadline_offset.unwrap_or(project_finish);
        backward_pass(&inputs, required_finish, &mut state.timings);

        let alap: Vec<ArenaIdx> = self
            .graph
            .topo_order()
            .iter()
            .copied()
            .filter(|&i| self.graph.node(i).constraint_kind == ConstraintKind::AsLateAsPossible)
            .collect();

        if !alap.is_empty() {
            let mut floors = start_floors.to_vec();
            for &idx in &alap {
                let late_start = state.timings[idx].late_start;
                floors[idx] = Some(floors[idx].map_or(late_start, |f| f.max(late_start)));
            }
            let refined = PassInputs {
                start_floors: &floors,
                ..inputs
            };
            conflicts = forward_pass(&refined, &mut state.timings);
            backward_pass(&refined, required_finish, &mut state.timings);
            state.alap_refined = true;
            log_debug!(
                verbosity,
                "Refined {} as-late-as-possible tasks",
                alap.len()
            );
        }

        conflicts.extend(self.late_constraint_conflicts(&state.timings));
        conflicts.sort_by_key(|c| c.task);
        for conflict in &conflicts {
            log_changes!(
                verbosity,
                "Constraint conflict on {}: {:?} by {} minutes",
                self.graph.id(conflict.task),
                conflict.kind,
                conflict.deviation
            );
        }

        state.conflicts = conflicts;
        state.required_finish = required_finish;
        state.project_finish = self.latest_early_finish(&state.timings);
        self.compute_float(&mut state);
        self.roll_up_summaries(&mut state);
        state
    }

    fn latest_early_finish(&self, timings: &[TaskTiming]) -> WorkMinutes {
        self.graph
            .topo_order()
            .iter()
            .map(|&i| timings[i].early_finish)
            .max()
            .unwrap_or(0)
    }

    /// No-later-than and deadline violations, visible only once early dates are final.
    fn late_constraint_conflicts(&self, timings: &[TaskTiming]) -> Vec<RawConflict> {
        let mut conflicts = Vec::new();
        for &idx in self.graph.topo_order() {
            let timing = &timings[idx];
            let node = self.graph.node(idx);
            match (node.constraint_kind, self.constraint_offsets[idx]) {
                (ConstraintKind::StartNoLaterThan, Some(date)) if timing.early_start > date => {
                    conflicts.push(RawConflict {
                        task: idx,
                        kind: ConflictKind::StartNoLaterThanViolated,
                        deviation: timing.early_start - date,
                    });
                }
                (ConstraintKind::FinishNoLaterThan, Some(date)) if timing.early_finish > date => {
                    conflicts.push(RawConflict {
                        task: idx,
                        kind: ConflictKind::FinishNoLaterThanViolated,
                        deviation: timing.early_finish - date,
                    });
                }
                _ => {}
            }
            if let Some(deadline) = self.deadline_offset {
                if timing.early_finish > deadline {
                    conflicts.push(RawConflict {
                        task: idx,
                        kind: ConflictKind::ProjectDeadline,
                        deviation: timing.early_finish - deadline,
                    });
                }
            }
        }
        conflicts
    }

    fn is_critical_float(&self, float: WorkMinutes) -> bool {
        self.axis.to_days(float) <= self.config.critical_tolerance_days
    }

    fn compute_float(&self, state: &mut ScheduleState) {
        for &idx in self.graph.topo_order() {
            let timing = state.timings[idx];
            let total = timing.total_float();
            let free = self
                .graph
                .successors(idx)
                .iter()
                .map(|edge| edge_slack(edge, &timing, &state.timings[edge.task]))
                .min()
                .unwrap_or(state.required_finish - timing.early_finish);

            state.total_float[idx] = total;
            state.free_float[idx] = free.min(total).max(0);
            state.critical[idx] = self.is_critical_float(total);
        }
    }

    /// Summary dates span their children; float and criticality follow the tightest child.
    ///
    /// Summaries without any task beneath them keep zero dates and are left
    /// out of their parent's span.
    fn roll_up_summaries(&self, state: &mut ScheduleState) {
        let mut dated: Vec<bool> = (0..self.graph.len())
            .map(|idx| !self.graph.is_summary(idx))
            .collect();
        for &idx in self.graph.summary_order() {
            let mut children = self
                .graph
                .node(idx)
                .children
                .iter()
                .copied()
                .filter(|&child| dated[child]);
            let Some(first) = children.next() else {
                continue;
            };
            let mut rolled = state.timings[first];
            let mut total = state.total_float[first];
            let mut free = state.free_float[first];
            let mut critical = state.critical[first];
            for child in children {
                let t = state.timings[child];
                rolled.early_start = rolled.early_start.min(t.early_start);
                rolled.early_finish = rolled.early_finish.max(t.early_finish);
                rolled.late_start = rolled.late_start.min(t.late_start);
                rolled.late_finish = rolled.late_finish.max(t.late_finish);
                total = total.min(state.total_float[child]);
                free = free.min(state.free_float[child]);
                critical |= state.critical[child];
            }
            state.timings[idx] = rolled;
            state.total_float[idx] = total;
            state.free_float[idx] = free;
            state.critical[idx] = critical;
            dated[idx] = true;
        }
    }

    /// Render the state into caller-facing dates.
    pub fn render(&self, state: &ScheduleState) -> Result<Schedule, EngineError> {
        let axis = self.axis;
        let all_conflicts: Vec<ConstraintConflict> = state
            .conflicts
            .iter()
            .map(|c| self.render_conflict(c))
            .collect();

        let mut entries = Vec::with_capacity(self.graph.len());
        for idx in 0..self.graph.len() {
            let node = self.graph.node(idx);
            let timing = &state.timings[idx];
            // A milestone is one instant: the start of a working day when its
            // constraint names a start date, otherwise the end of the previous one.
            let (early_start, late_start, early_finish, late_finish) = match node.kind {
                TaskKind::Milestone
                    if node.constraint_kind.requires_date()
                        && !node.constraint_kind.anchors_finish() =>
                {
                    (
                        axis.start_instant(timing.early_start)?,
                        axis.start_instant(timing.late_start)?,
                        axis.start_instant(timing.early_finish)?,
                        axis.start_instant(timing.late_finish)?,
                    )
                }
                TaskKind::Milestone => (
                    axis.finish_instant(timing.early_start)?,
                    axis.finish_instant(timing.late_start)?,
                    axis.finish_instant(timing.early_finish)?,
                    axis.finish_instant(timing.late_finish)?,
                ),
                _ => (
                    axis.start_instant(timing.early_start)?,
                    axis.start_instant(timing.late_start)?,
                    axis.finish_instant(timing.early_finish)?,
                    axis.finish_instant(timing.late_finish)?,
                ),
            };
            let task_id = self.graph.id(idx);

            entries.push(ScheduleEntry {
                task_id: task_id.to_string(),
                kind: node.kind,
                early_start,
                early_finish,
                late_start,
                late_finish,
                early_start_days: axis.to_days(timing.early_start),
                early_finish_days: axis.to_days(timing.early_finish),
                late_start_days: axis.to_days(timing.late_start),
                late_finish_days: axis.to_days(timing.late_finish),
                total_float_days: axis.to_days(state.total_float[idx]),
                free_float_days: axis.to_days(state.free_float[idx]),
                critical: state.critical[idx],
                conflicts: state
                    .conflicts_for(idx)
                    .map(|c| self.render_conflict(c))
                    .collect(),
            });
        }

        let mut metadata = HashMap::new();
        metadata.insert("algorithm".to_string(), "cpm_forward_backward".to_string());
        metadata.insert("tasks".to_string(), self.graph.len().to_string());
        metadata.insert("dependencies".to_string(), self.graph.edge_count().to_string());
        metadata.insert("alap_refined".to_string(), state.alap_refined.to_string());
        metadata.insert("conflicts".to_string(), all_conflicts.len().to_string());

        Ok(Schedule {
            entries,
            conflicts: all_conflicts,
            project_start: axis.origin(),
            project_finish: axis.finish_instant(state.project_finish)?,
            project_duration_days: axis.to_days(state.project_finish),
            metadata,
        })
    }

    fn render_conflict(&self, conflict: &RawConflict) -> ConstraintConflict {
        let task_id = self.graph.id(conflict.task);
        let node = self.graph.node(conflict.task);
        let deviation_days = self.axis.to_days(conflict.deviation);
        let (constraint_date, message) = match conflict.kind {
            ConflictKind::PinnedBeforeDependencies => (
                node.constraint_date,
                format!(
                    "{} is pinned {:.2} working days before its dependencies allow; the pinned date is kept",
                    task_id, deviation_days
                ),
            ),
            ConflictKind::StartNoLaterThanViolated => (
                node.constraint_date,
                format!(
                    "{} starts {:.2} working days after its start-no-later-than date",
                    task_id, deviation_days
                ),
            ),
            ConflictKind::FinishNoLaterThanViolated => (
                node.constraint_date,
                format!(
                    "{} finishes {:.2} working days after its finish-no-later-than date",
                    task_id, deviation_days
                ),
            ),
            ConflictKind::ProjectDeadline => (
                self.deadline,
                format!(
                    "{} finishes {:.2} working days after the project deadline",
                    task_id, deviation_days
                ),
            ),
        };

        ConstraintConflict {
            task_id: task_id.to_string(),
            kind: conflict.kind,
            constraint_date,
            deviation_days,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WorkingCalendar;
    use crate::models::{Calendar, Dependency, DependencyType, Task};

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn task(id: &str, duration: f64) -> Task {
        Task::new(
            id.to_string(),
            duration,
            TaskKind::Task,
            ConstraintKind::AsSoonAsPossible,
            None,
            None,
        )
    }

    fn constrained(id: &str, duration: f64, kind: ConstraintKind, date: NaiveDate) -> Task {
        let mut t = task(id, duration);
        t.constraint_kind = kind;
        t.constraint_date = Some(date);
        t
    }

    fn dep(pred: &str, succ: &str, dependency_type: DependencyType, lag: f64) -> Dependency {
        Dependency::new(pred.to_string(), succ.to_string(), dependency_type, lag)
    }

    fn fs(pred: &str, succ: &str) -> Dependency {
        dep(pred, succ, DependencyType::FinishToStart, 0.0)
    }

    /// Schedule from Monday 2025-01-06 on a Mon-Fri, 8h calendar.
    fn run(tasks: &[Task], deps: &[Dependency], deadline: Option<NaiveDate>) -> Schedule {
        let calendar = WorkingCalendar::new(&Calendar::default(), 3660).unwrap();
        let graph = TaskGraph::build(tasks, deps, &calendar).unwrap();
        let axis = WorkAxis::new(calendar, d(2025, 1, 6)).unwrap();
        let config = EngineConfig::default();
        let scheduler = ForwardBackwardScheduler::new(&graph, &axis, deadline, &config);
        let state = scheduler.compute();
        scheduler.render(&state).unwrap()
    }

    fn early(schedule: &Schedule, id: &str) -> (f64, f64) {
        let e = schedule.entry(id).unwrap();
        (e.early_start_days, e.early_finish_days)
    }

    fn float(schedule: &Schedule, id: &str) -> f64 {
        schedule.entry(id).unwrap().total_float_days
    }

    #[test]
    fn test_chain_with_lag() {
        let tasks = vec![task("a", 3.0), task("b", 2.0), task("c", 1.0)];
        let deps = vec![
            dep("a", "b", DependencyType::FinishToStart, 1.0),
            fs("b", "c"),
        ];
        let schedule = run(&tasks, &deps, None);

        assert_eq!(early(&schedule, "a"), (0.0, 3.0));
        assert_eq!(early(&schedule, "b"), (4.0, 6.0));
        assert_eq!(early(&schedule, "c"), (6.0, 7.0));
        for id in ["a", "b", "c"] {
            assert_eq!(float(&schedule, id), 0.0);
            assert!(schedule.entry(id).unwrap().critical);
        }
        assert_eq!(schedule.project_duration_days, 7.0);
    }

    #[test]
    fn test_parallel_task_float() {
        let tasks = vec![task("a", 3.0), task("b", 2.0), task("c", 2.0), task("d", 5.0)];
        let deps = vec![fs("a", "b"), fs("b", "c")];
        let schedule = run(&tasks, &deps, None);

        assert_eq!(float(&schedule, "d"), 2.0);
        assert!(!schedule.entry("d").unwrap().critical);
        assert_eq!(schedule.entry("d").unwrap().free_float_days, 2.0);
    }

    #[test]
    fn test_dependency_types() {
        let tasks = vec![
            task("a", 4.0),
            task("ss", 2.0),
            task("ff", 2.0),
            task("sf", 1.0),
        ];
        let deps = vec![
            dep("a", "ss", DependencyType::StartToStart, 1.0),
            dep("a", "ff", DependencyType::FinishToFinish, 1.0),
            dep("a", "sf", DependencyType::StartToFinish, 2.0),
        ];
        let schedule = run(&tasks, &deps, None);

        assert_eq!(early(&schedule, "ss"), (1.0, 3.0));
        assert_eq!(early(&schedule, "ff"), (3.0, 5.0));
        assert_eq!(early(&schedule, "sf"), (1.0, 2.0));
        // ff drives the project finish at day 5
        assert_eq!(float(&schedule, "ff"), 0.0);
        assert_eq!(float(&schedule, "a"), 0.0);
        assert_eq!(float(&schedule, "ss"), 2.0);
    }

    #[test]
    fn test_lead_never_starts_before_project() {
        let tasks = vec![task("a", 1.0), task("b", 1.0)];
        let deps = vec![dep("a", "b", DependencyType::StartToStart, -3.0)];
        let schedule = run(&tasks, &deps, None);
        assert_eq!(early(&schedule, "b"), (0.0, 1.0));
    }

    #[test]
    fn test_start_no_earlier_than() {
        // Wednesday is day 2
        let tasks = vec![constrained(
            "a",
            1.0,
            ConstraintKind::StartNoEarlierThan,
            d(2025, 1, 8),
        )];
        let schedule = run(&tasks, &[], None);
        assert_eq!(early(&schedule, "a"), (2.0, 3.0));
        assert!(schedule.conflicts.is_empty());
    }

    #[test]
    fn test_finish_no_earlier_than() {
        // Must not finish before the end of Thursday (day 4)
        let tasks = vec![constrained(
            "a",
            2.0,
            ConstraintKind::FinishNoEarlierThan,
            d(2025, 1, 9),
        )];
        let schedule = run(&tasks, &[], None);
        assert_eq!(early(&schedule, "a"), (2.0, 4.0));
    }

    #[test]
    fn test_must_start_on_wins_and_records_conflict() {
        let tasks = vec![
            task("a", 3.0),
            constrained("b", 1.0, ConstraintKind::MustStartOn, d(2025, 1, 7)),
        ];
        let schedule = run(&tasks, &[fs("a", "b")], None);

        assert_eq!(early(&schedule, "b"), (1.0, 2.0));
        let entry = schedule.entry("b").unwrap();
        assert_eq!(entry.conflicts.len(), 1);
        assert_eq!(entry.conflicts[0].kind, ConflictKind::PinnedBeforeDependencies);
        assert_eq!(entry.conflicts[0].deviation_days, 2.0);
        assert_eq!(entry.conflicts[0].constraint_date, Some(d(2025, 1, 7)));
        assert!(schedule.has_conflicts());
        // a cannot finish before the pinned b starts: negative float
        assert_eq!(float(&schedule, "a"), -2.0);
    }

    #[test]
    fn test_must_finish_on() {
        let tasks = vec![constrained(
            "a",
            2.0,
            ConstraintKind::MustFinishOn,
            d(2025, 1, 10),
        )];
        let schedule = run(&tasks, &[], None);
        assert_eq!(early(&schedule, "a"), (3.0, 5.0));
        assert_eq!(float(&schedule, "a"), 0.0);
        assert!(schedule.conflicts.is_empty());
    }

    #[test]
    fn test_start_no_later_than_violation() {
        let tasks = vec![
            task("a", 3.0),
            constrained("b", 1.0, ConstraintKind::StartNoLaterThan, d(2025, 1, 7)),
        ];
        let schedule = run(&tasks, &[fs("a", "b")], None);

        // Dependencies win for no-later-than constraints
        assert_eq!(early(&schedule, "b"), (3.0, 4.0));
        let entry = schedule.entry("b").unwrap();
        assert_eq!(entry.conflicts[0].kind, ConflictKind::StartNoLaterThanViolated);
        assert_eq!(entry.total_float_days, -2.0);
        assert!(entry.critical);
    }

    #[test]
    fn test_finish_no_later_than_limits_late_dates() {
        let tasks = vec![
            task("long", 5.0),
            constrained("short", 1.0, ConstraintKind::FinishNoLaterThan, d(2025, 1, 8)),
        ];
        let schedule = run(&tasks, &[], None);
        assert_eq!(schedule.entry("short").unwrap().late_finish_days, 3.0);
        assert_eq!(float(&schedule, "short"), 2.0);
        assert!(schedule.conflicts.is_empty());
    }

    #[test]
    fn test_as_late_as_possible() {
        let mut late = task("late", 1.0);
        late.constraint_kind = ConstraintKind::AsLateAsPossible;
        let tasks = vec![task("a", 5.0), late, task("end", 1.0)];
        let deps = vec![fs("a", "end"), fs("late", "end")];
        let schedule = run(&tasks, &deps, None);

        assert_eq!(early(&schedule, "late"), (4.0, 5.0));
        assert_eq!(float(&schedule, "late"), 0.0);
        assert_eq!(early(&schedule, "end"), (5.0, 6.0));
        assert_eq!(schedule.metadata.get("alap_refined").unwrap(), "true");
    }

    #[test]
    fn test_deadline_sets_required_finish() {
        let tasks = vec![task("a", 3.0)];
        // Friday close is day 5
        let schedule = run(&tasks, &[], Some(d(2025, 1, 10)));
        assert_eq!(float(&schedule, "a"), 2.0);
        assert!(!schedule.entry("a").unwrap().critical);
    }

    #[test]
    fn test_missed_deadline_is_a_conflict() {
        let tasks = vec![task("a", 3.0)];
        let schedule = run(&tasks, &[], Some(d(2025, 1, 7)));
        let entry = schedule.entry("a").unwrap();
        assert_eq!(entry.conflicts[0].kind, ConflictKind::ProjectDeadline);
        assert_eq!(entry.conflicts[0].deviation_days, 1.0);
        assert_eq!(entry.total_float_days, -1.0);
    }

    #[test]
    fn test_summary_rollup() {
        let mut phase = task("phase", 0.0);
        phase.kind = TaskKind::Summary;
        let mut design = task("design", 2.0);
        design.parent_id = Some("phase".to_string());
        let mut build = task("build", 3.0);
        build.parent_id = Some("phase".to_string());
        let tasks = vec![phase, design, build, task("side", 1.0)];
        let schedule = run(&tasks, &[fs("design", "build")], None);

        let phase = schedule.entry("phase").unwrap();
        assert_eq!((phase.early_start_days, phase.early_finish_days), (0.0, 5.0));
        assert!(phase.critical);
        assert_eq!(phase.total_float_days, 0.0);
        assert_eq!(phase.kind, TaskKind::Summary);
    }

    #[test]
    fn test_milestone_instants() {
        let mut m = task("m", 0.0);
        m.kind = TaskKind::Milestone;
        let tasks = vec![task("a", 1.0), m];
        let schedule = run(&tasks, &[fs("a", "m")], None);

        let entry = schedule.entry("m").unwrap();
        let end_of_monday = d(2025, 1, 6).and_hms_opt(17, 0, 0).unwrap();
        assert_eq!(entry.early_start, end_of_monday);
        assert_eq!(entry.early_finish, end_of_monday);
        assert!(entry.critical);
    }

    #[test]
    fn test_start_pinned_milestone_renders_its_date() {
        let mut m = constrained("m", 0.0, ConstraintKind::MustStartOn, d(2025, 1, 8));
        m.kind = TaskKind::Milestone;
        let schedule = run(&[m, task("long", 5.0)], &[], None);

        let entry = schedule.entry("m").unwrap();
        let wednesday_morning = d(2025, 1, 8).and_hms_opt(9, 0, 0).unwrap();
        assert_eq!(entry.early_start, wednesday_morning);
        assert_eq!(entry.early_finish, wednesday_morning);
        assert_eq!(entry.early_start_days, 2.0);
        assert!(entry.conflicts.is_empty());
    }

    #[test]
    fn test_empty_nested_summary_ignored_in_rollup() {
        let mut outer = task("outer", 0.0);
        outer.kind = TaskKind::Summary;
        let mut empty = task("empty", 0.0);
        empty.kind = TaskKind::Summary;
        empty.parent_id = Some("outer".to_string());
        let mut work = task("work", 2.0);
        work.parent_id = Some("outer".to_string());
        let tasks = vec![outer, empty, task("pre", 5.0), work];
        let schedule = run(&tasks, &[fs("pre", "work")], None);

        assert_eq!(early(&schedule, "outer"), (5.0, 7.0));
        assert_eq!(float(&schedule, "outer"), 0.0);
        assert_eq!(early(&schedule, "empty"), (0.0, 0.0));
    }

    #[test]
    fn test_finish_to_start_property() {
        let tasks = vec![
            task("a", 2.0),
            task("b", 4.5),
            task("c", 1.0),
            task("d", 3.0),
        ];
        let deps = vec![fs("a", "c"), fs("b", "c"), fs("c", "d")];
        let schedule = run(&tasks, &deps, None);

        let max_pred_finish = early(&schedule, "a").1.max(early(&schedule, "b").1);
        assert_eq!(early(&schedule, "c").0, max_pred_finish);
        assert_eq!(early(&schedule, "d").0, early(&schedule, "c").1);
        assert_eq!(early(&schedule, "a").0, 0.0);
    }

    #[test]
    fn test_idempotent() {
        let tasks = vec![task("a", 3.0), task("b", 2.0), task("c", 1.5)];
        let deps = vec![fs("a", "b"), dep("a", "c", DependencyType::StartToStart, 0.5)];
        let first = run(&tasks, &deps, None);
        let second = run(&tasks, &deps, None);
        assert_eq!(first.entries, second.entries);
        assert_eq!(first.conflicts, second.conflicts);
    }
}
