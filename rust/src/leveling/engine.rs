//! Resource leveling by delaying non-critical tasks within their float.

use rustc_hash::FxHashSet;

use crate::calendar::WorkMinutes;
use crate::error::EngineError;
use crate::interner::ArenaIdx;
use crate::models::{LevelingResult, TaskKind, TaskShift};
use crate::scheduler::{dependency_start_bound, ForwardBackwardScheduler, ScheduleState, TaskTiming};
use crate::{log_changes, log_checks};

use super::timeline::{day_end, DayDates, ResourcePool, ResourceTimeline, LOAD_EPSILON};

/// Resolves over-allocations without moving critical or pinned tasks.
pub struct ResourceLevelingEngine<'a> {
    scheduler: &'a ForwardBackwardScheduler<'a>,
    pool: &'a ResourcePool,
}

impl<'a> ResourceLevelingEngine<'a> {
    pub fn new(scheduler: &'a ForwardBackwardScheduler<'a>, pool: &'a ResourcePool) -> Self {
        Self { scheduler, pool }
    }

    /// Level `baseline` and return the revised schedule.
    ///
    /// Repeatedly takes the earliest over-allocated resource day and looks for
    /// the contributing task with the most float that can be delayed to a later
    /// day start, no further than its late start, such that total
    /// over-allocation drops. Downstream tasks are pushed along. A move that
    /// only relocates the overload is not kept; a day nothing can relieve is
    /// left as a conflict. Accepted moves strictly increase one early start
    /// bounded by its late start, so the loop terminates.
    pub fn level(&self, baseline: &ScheduleState) -> Result<LevelingResult, EngineError> {
        let graph = self.scheduler.graph();
        let axis = self.scheduler.axis();
        let verbosity = self.scheduler.config().verbosity;

        let mut timings: Vec<TaskTiming> = baseline.timings.clone();
        let mut floors: Vec<Option<WorkMinutes>> = vec![None; graph.len()];
        let mut unresolved: FxHashSet<(usize, i64)> = FxHashSet::default();
        let mut dates = DayDates::default();
        let mut timeline = ResourceTimeline::build(axis, graph, self.pool, &timings, &mut dates)?;

        loop {
            let Some((resource, day)) = timeline.first_over_allocation(&unresolved) else {
                break;
            };
            let Some(bucket) = timeline.bucket(resource, day) else {
                break;
            };
            let date = bucket.date;
            let mut candidates: Vec<(WorkMinutes, ArenaIdx)> = bucket
                .tasks
                .iter()
                .copied()
                .filter(|&t| self.is_movable(t, baseline))
                .map(|t| (baseline.timings[t].late_start - timings[t].early_start, t))
                .collect();
            // Most float first, then earliest input position
            candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

            let deficit = timeline.total_deficit();
            let mut accepted = None;
            'search: for &(float, task) in &candidates {
                let late_start = baseline.timings[task].late_start;
                let mut target = day_end(axis, day);
                while target <= late_start {
                    let mut trial_floors = floors.clone();
                    trial_floors[task] = Some(target);
                    let mut trial = timings.clone();
                    self.shift(task, target, &trial_floors, &mut trial);
                    let revised =
                        ResourceTimeline::build(axis, graph, self.pool, &trial, &mut dates)?;
                    if revised.total_deficit() + LOAD_EPSILON < deficit {
                        accepted = Some((task, float, trial, trial_floors, revised));
                        break 'search;
                    }
                    target += axis.minutes_per_day();
                }
            }

            let Some((task, float, trial, trial_floors, revised)) = accepted else {
                log_checks!(
                    verbosity,
                    "No move relieves {} on {}",
                    self.pool.profiles[resource].resource_id,
                    date
                );
                unresolved.insert((resource, day));
                continue;
            };

            log_changes!(
                verbosity,
                "Delaying {} by {} minutes to relieve {} on {} (float {} minutes)",
                graph.id(task),
                trial[task].early_start - timings[task].early_start,
                self.pool.profiles[resource].resource_id,
                date,
                float
            );
            timings = trial;
            floors = trial_floors;
            timeline = revised;
        }

        let revised = self.scheduler.compute_with_floors(&floors);
        let timeline =
            ResourceTimeline::build(axis, graph, self.pool, &revised.timings, &mut dates)?;
        let conflicts = timeline.conflicts(self.pool, graph);

        let mut shifts = Vec::new();
        for idx in 0..graph.len() {
            if graph.is_summary(idx) {
                continue;
            }
            let from = baseline.timings[idx].early_start;
            let to = revised.timings[idx].early_start;
            if to > from {
                shifts.push(TaskShift {
                    task_id: graph.id(idx).to_string(),
                    delay_days: axis.to_days(to - from),
                    from_start: axis.start_instant(from)?,
                    to_start: axis.start_instant(to)?,
                });
            }
        }

        if !conflicts.is_empty() {
            log_changes!(
                verbosity,
                "{} resource days remain over-allocated after leveling",
                conflicts.len()
            );
        }

        Ok(LevelingResult {
            schedule: self.scheduler.render(&revised)?,
            allocations: timeline.allocations(self.pool),
            conflicts,
            shifts,
        })
    }

    fn is_movable(&self, task: ArenaIdx, baseline: &ScheduleState) -> bool {
        let node = self.scheduler.graph().node(task);
        node.kind == TaskKind::Task
            && node.duration > 0
            && !node.constraint_kind.is_pinned()
            && !baseline.critical[task]
    }

    /// Move `task` to `start` and re-propagate early dates downstream.
    fn shift(
        &self,
        task: ArenaIdx,
        start: WorkMinutes,
        floors: &[Option<WorkMinutes>],
        timings: &mut [TaskTiming],
    ) {
        let graph = self.scheduler.graph();
        let duration = graph.node(task).duration;
        timings[task].early_start = start;
        timings[task].early_finish = start + duration;

        for idx in graph.downstream_of(task) {
            let node = graph.node(idx);
            if node.constraint_kind.is_pinned() {
                continue;
            }
            let mut es = timings[idx]
                .early_start
                .max(dependency_start_bound(graph, idx, timings));
            if let Some(floor) = floors[idx] {
                es = es.max(floor);
            }
            timings[idx].early_start = es;
            timings[idx].early_finish = es + node.duration;
        }
    }
}
