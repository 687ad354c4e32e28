//! Per-resource daily load derived from task dates.

use chrono::NaiveDate;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;

use crate::calendar::{WorkAxis, WorkingCalendar, WorkMinutes};
use crate::error::EngineError;
use crate::graph::TaskGraph;
use crate::interner::{ArenaIdx, IdInterner};
use crate::models::{
    LevelingConflict, ProjectSnapshot, ResourceAllocation, ResourceAssignment, ResourceDay,
};
use crate::scheduler::TaskTiming;

/// Allocation comparisons ignore differences below this many percent.
pub(super) const LOAD_EPSILON: f64 = 1e-9;

/// Working time and capacity of one resource.
#[derive(Clone, Debug)]
pub struct ResourceProfile {
    pub resource_id: String,
    pub calendar: WorkingCalendar,
    pub max_capacity_percent: f64,
}

impl ResourceProfile {
    /// Capacity on `date`; zero on the resource's non-working days.
    pub fn capacity_on(&self, date: NaiveDate) -> f64 {
        if self.calendar.is_working_day(date) {
            self.max_capacity_percent
        } else {
            0.0
        }
    }
}

/// One assignment resolved against the task graph and the resource list.
#[derive(Clone, Debug)]
pub struct TaskLoad {
    pub task: ArenaIdx,
    pub resource: usize,
    pub assignment: ResourceAssignment,
}

/// Resources and the loads placed on them.
#[derive(Clone, Debug, Default)]
pub struct ResourcePool {
    pub profiles: Vec<ResourceProfile>,
    pub loads: Vec<TaskLoad>,
}

impl ResourcePool {
    /// Resolve resource calendars and assignments.
    ///
    /// Resources are ordered by their resource calendar, then by first
    /// appearance in an assignment. Resources without a calendar of their own
    /// use `project_calendar` at 100% capacity. Assignments to summary tasks
    /// carry no load.
    pub fn build(
        snapshot: &ProjectSnapshot,
        graph: &TaskGraph,
        project_calendar: &WorkingCalendar,
        max_scan_days: u32,
    ) -> Result<Self, EngineError> {
        let mut index = IdInterner::default();
        let mut profiles = Vec::new();

        for rc in &snapshot.resource_calendars {
            if !rc.max_capacity_percent.is_finite() || rc.max_capacity_percent < 0.0 {
                return Err(EngineError::InvalidCalendar {
                    calendar_id: rc.resource_id.clone(),
                    reason: format!(
                        "max_capacity_percent must be non-negative, got {}",
                        rc.max_capacity_percent
                    ),
                });
            }
            if index.intern_unique(&rc.resource_id).is_none() {
                return Err(EngineError::InvalidCalendar {
                    calendar_id: rc.resource_id.clone(),
                    reason: "resource calendar defined twice".to_string(),
                });
            }
            let calendar = match &rc.calendar {
                Some(c) => WorkingCalendar::new(c, max_scan_days)?,
                None => project_calendar.clone(),
            };
            profiles.push(ResourceProfile {
                resource_id: rc.resource_id.clone(),
                calendar,
                max_capacity_percent: rc.max_capacity_percent,
            });
        }

        let mut loads = Vec::with_capacity(snapshot.assignments.len());
        for assignment in &snapshot.assignments {
            let task = graph
                .idx(&assignment.task_id)
                .ok_or_else(|| EngineError::UnknownAssignmentTask {
                    task_id: assignment.task_id.clone(),
                    resource_id: assignment.resource_id.clone(),
                })?;
            if !assignment.allocation_percent.is_finite() || assignment.allocation_percent < 0.0 {
                return Err(EngineError::InvalidAllocation {
                    task_id: assignment.task_id.clone(),
                    resource_id: assignment.resource_id.clone(),
                    allocation_percent: assignment.allocation_percent,
                });
            }

            let resource = match index.get(&assignment.resource_id) {
                Some(r) => r,
                None => {
                    profiles.push(ResourceProfile {
                        resource_id: assignment.resource_id.clone(),
                        calendar: project_calendar.clone(),
                        max_capacity_percent: 100.0,
                    });
                    index.intern(&assignment.resource_id)
                }
            };

            if graph.is_summary(task) {
                continue;
            }
            loads.push(TaskLoad {
                task,
                resource,
                assignment: assignment.clone(),
            });
        }

        Ok(Self { profiles, loads })
    }
}

/// Load of one resource on one axis day.
#[derive(Clone, Debug, PartialEq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub allocated_percent: f64,
    pub capacity_percent: f64,
    /// Contributing tasks in input order.
    pub tasks: Vec<ArenaIdx>,
}

impl DayBucket {
    pub fn is_over_allocated(&self) -> bool {
        self.allocated_percent > self.capacity_percent + LOAD_EPSILON
    }
}

/// Calendar dates of axis days, kept across timeline rebuilds.
///
/// Non-negative days are extended one working day at a time; days before the
/// origin only occur for tasks pinned ahead of the project start.
#[derive(Clone, Debug, Default)]
pub struct DayDates {
    forward: Vec<NaiveDate>,
    before_origin: FxHashMap<i64, NaiveDate>,
}

impl DayDates {
    pub fn date(&mut self, axis: &WorkAxis, day: i64) -> Result<NaiveDate, EngineError> {
        let Ok(index) = usize::try_from(day) else {
            if let Some(&date) = self.before_origin.get(&day) {
                return Ok(date);
            }
            let date = axis.day_date(day)?;
            self.before_origin.insert(day, date);
            return Ok(date);
        };
        while self.forward.len() <= index {
            let next = match self.forward.last() {
                Some(&last) => {
                    let after = last
                        .succ_opt()
                        .ok_or_else(|| EngineError::NoWorkingTime {
                            calendar_id: axis.calendar().id().to_string(),
                        })?;
                    axis.calendar().next_working_day(after)?
                }
                None => axis.origin().date(),
            };
            self.forward.push(next);
        }
        Ok(self.forward[index])
    }
}

/// Daily buckets per resource, keyed by axis day index.
#[derive(Clone, Debug)]
pub struct ResourceTimeline {
    buckets: Vec<BTreeMap<i64, DayBucket>>,
}

impl ResourceTimeline {
    /// Spread every load over the axis days its task occupies.
    ///
    /// Day `k` covers offsets `[k * M, (k + 1) * M)` where `M` is the working
    /// minutes per day; a task with non-zero duration occupies every day its
    /// `[early_start, early_finish)` interval touches.
    pub fn build(
        axis: &WorkAxis,
        graph: &TaskGraph,
        pool: &ResourcePool,
        timings: &[TaskTiming],
        dates: &mut DayDates,
    ) -> Result<Self, EngineError> {
        let mut buckets: Vec<BTreeMap<i64, DayBucket>> =
            vec![BTreeMap::new(); pool.profiles.len()];

        for load in &pool.loads {
            let node = graph.node(load.task);
            if node.duration <= 0 {
                continue;
            }
            let timing = &timings[load.task];
            let first = axis.day_index(timing.early_start);
            let last = axis.day_index(timing.early_finish - 1);
            let profile = &pool.profiles[load.resource];

            for day in first..=last {
                let date = dates.date(axis, day)?;
                if !load.assignment.applies_on(date) {
                    continue;
                }
                let bucket = buckets[load.resource].entry(day).or_insert_with(|| DayBucket {
                    date,
                    allocated_percent: 0.0,
                    capacity_percent: profile.capacity_on(date),
                    tasks: Vec::new(),
                });
                bucket.allocated_percent += load.assignment.allocation_percent;
                if !bucket.tasks.contains(&load.task) {
                    bucket.tasks.push(load.task);
                }
            }
        }

        for resource in &mut buckets {
            for bucket in resource.values_mut() {
                bucket.tasks.sort_unstable();
            }
        }
        Ok(Self { buckets })
    }

    pub fn bucket(&self, resource: usize, day: i64) -> Option<&DayBucket> {
        self.buckets.get(resource).and_then(|b| b.get(&day))
    }

    /// Earliest over-allocated (resource, day), ties broken by resource order.
    pub fn first_over_allocation(&self, skip: &FxHashSet<(usize, i64)>) -> Option<(usize, i64)> {
        self.buckets
            .iter()
            .enumerate()
            .filter_map(|(resource, days)| {
                days.iter()
                    .find(|(&day, bucket)| {
                        bucket.is_over_allocated() && !skip.contains(&(resource, day))
                    })
                    .map(|(&day, _)| (day, resource))
            })
            .min()
            .map(|(day, resource)| (resource, day))
    }

    /// Over-allocation summed over every resource day, in percent.
    pub fn total_deficit(&self) -> f64 {
        self.buckets
            .iter()
            .flat_map(|days| days.values())
            .filter(|bucket| bucket.is_over_allocated())
            .map(|bucket| bucket.allocated_percent - bucket.capacity_percent)
            .sum()
    }

    pub fn allocations(&self, pool: &ResourcePool) -> Vec<ResourceAllocation> {
        pool.profiles
            .iter()
            .zip(&self.buckets)
            .map(|(profile, days)| ResourceAllocation {
                resource_id: profile.resource_id.clone(),
                days: days
                    .values()
                    .map(|bucket| ResourceDay {
                        date: bucket.date,
                        allocated_percent: bucket.allocated_percent,
                        capacity_percent: bucket.capacity_percent,
                        over_allocated: bucket.is_over_allocated(),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Every remaining over-allocated day, by date then resource.
    pub fn conflicts(&self, pool: &ResourcePool, graph: &TaskGraph) -> Vec<LevelingConflict> {
        let mut conflicts: Vec<(i64, usize, LevelingConflict)> = Vec::new();
        for (resource, days) in self.buckets.iter().enumerate() {
            for (&day, bucket) in days.iter().filter(|(_, b)| b.is_over_allocated()) {
                conflicts.push((
                    day,
                    resource,
                    LevelingConflict {
                        resource_id: pool.profiles[resource].resource_id.clone(),
                        date: bucket.date,
                        deficit_percent: bucket.allocated_percent - bucket.capacity_percent,
                        task_ids: bucket
                            .tasks
                            .iter()
                            .map(|&t| graph.id(t).to_string())
                            .collect(),
                    },
                ));
            }
        }
        conflicts.sort_by_key(|(day, resource, _)| (*day, *resource));
        conflicts.into_iter().map(|(_, _, c)| c).collect()
    }
}

/// First instant after axis day `day`.
pub fn day_end(axis: &WorkAxis, day: i64) -> WorkMinutes {
    (day + 1) * axis.minutes_per_day()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Calendar, ConstraintKind, Dependency, ResourceCalendar, Task, TaskKind,
    };

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

    fn assign(task: &str, resource: &str, percent: f64) -> ResourceAssignment {
        ResourceAssignment::new(task.to_string(), resource.to_string(), percent, None, None)
    }

    fn snapshot(
        tasks: Vec<Task>,
        assignments: Vec<ResourceAssignment>,
        resource_calendars: Vec<ResourceCalendar>,
    ) -> ProjectSnapshot {
        ProjectSnapshot::new(
            tasks,
            Vec::<Dependency>::new(),
            d(2025, 1, 6),
            None,
            Some(assignments),
            Some(resource_calendars),
            None,
        )
    }

    struct Fixture {
        graph: TaskGraph,
        axis: WorkAxis,
        pool: ResourcePool,
    }

    fn fixture(snapshot: &ProjectSnapshot) -> Result<Fixture, EngineError> {
        let calendar = WorkingCalendar::new(&snapshot.calendar, 3660)?;
        let graph = TaskGraph::build(&snapshot.tasks, &snapshot.dependencies, &calendar)?;
        let pool = ResourcePool::build(snapshot, &graph, &calendar, 3660)?;
        let axis = WorkAxis::new(calendar, snapshot.project_start)?;
        Ok(Fixture { graph, axis, pool })
    }

    fn build(f: &Fixture, timings: &[TaskTiming]) -> ResourceTimeline {
        ResourceTimeline::build(&f.axis, &f.graph, &f.pool, timings, &mut DayDates::default())
            .unwrap()
    }

    fn timing(es_days: i64, ef_days: i64) -> TaskTiming {
        TaskTiming {
            early_start: es_days * 480,
            early_finish: ef_days * 480,
            late_start: es_days * 480,
            late_finish: ef_days * 480,
        }
    }

    #[test]
    fn test_pool_orders_resources() {
        let snap = snapshot(
            vec![task("a", 1.0)],
            vec![assign("a", "bob", 50.0), assign("a", "alice", 50.0)],
            vec![ResourceCalendar::new("alice".to_string(), None, 80.0)],
        );
        let f = fixture(&snap).unwrap();
        let ids: Vec<&str> = f.pool.profiles.iter().map(|p| p.resource_id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob"]);
        assert_eq!(f.pool.profiles[0].max_capacity_percent, 80.0);
        assert_eq!(f.pool.profiles[1].max_capacity_percent, 100.0);
        assert_eq!(f.pool.loads[0].resource, 1);
    }

    #[test]
    fn test_pool_rejects_unknown_task() {
        let snap = snapshot(vec![task("a", 1.0)], vec![assign("ghost", "r", 50.0)], vec![]);
        assert_eq!(
            fixture(&snap).err(),
            Some(EngineError::UnknownAssignmentTask {
                task_id: "ghost".to_string(),
                resource_id: "r".to_string(),
            })
        );
    }

    #[test]
    fn test_pool_rejects_negative_allocation() {
        let snap = snapshot(vec![task("a", 1.0)], vec![assign("a", "r", -5.0)], vec![]);
        assert!(matches!(
            fixture(&snap),
            Err(EngineError::InvalidAllocation { .. })
        ));
    }

    #[test]
    fn test_buckets_sum_overlapping_loads() {
        let snap = snapshot(
            vec![task("a", 2.0), task("b", 2.0)],
            vec![assign("a", "r", 60.0), assign("b", "r", 60.0)],
            vec![],
        );
        let f = fixture(&snap).unwrap();
        let timings = vec![timing(0, 2), timing(1, 3)];
        let timeline = build(&f, &timings);

        assert_eq!(timeline.bucket(0, 0).unwrap().allocated_percent, 60.0);
        let overlap = timeline.bucket(0, 1).unwrap();
        assert_eq!(overlap.allocated_percent, 120.0);
        assert_eq!(overlap.tasks, vec![0, 1]);
        assert_eq!(overlap.date, d(2025, 1, 7));
        assert!(overlap.is_over_allocated());

        assert_eq!(timeline.first_over_allocation(&FxHashSet::default()), Some((0, 1)));
        let mut skip = FxHashSet::default();
        skip.insert((0, 1));
        assert_eq!(timeline.first_over_allocation(&skip), None);

        assert!((timeline.total_deficit() - 20.0).abs() < 1e-9);

        let conflicts = timeline.conflicts(&f.pool, &f.graph);
        assert_eq!(conflicts.len(), 1);
        assert!((conflicts[0].deficit_percent - 20.0).abs() < 1e-9);
        assert_eq!(conflicts[0].task_ids, vec!["a", "b"]);
    }

    #[test]
    fn test_non_working_resource_day_has_zero_capacity() {
        // Resource only works Mon/Tue
        let mut part_time = Calendar::default();
        part_time.id = "part_time".to_string();
        part_time.working_weekdays = vec![1, 2];
        let snap = snapshot(
            vec![task("a", 3.0)],
            vec![assign("a", "r", 50.0)],
            vec![ResourceCalendar::new("r".to_string(), Some(part_time), 100.0)],
        );
        let f = fixture(&snap).unwrap();
        let timeline = build(&f, &[timing(0, 3)]);

        let wednesday = timeline.bucket(0, 2).unwrap();
        assert_eq!(wednesday.capacity_percent, 0.0);
        assert!(wednesday.is_over_allocated());
        assert!(!timeline.bucket(0, 1).unwrap().is_over_allocated());

        let allocations = timeline.allocations(&f.pool);
        assert_eq!(allocations[0].days.len(), 3);
        assert!(allocations[0].days[2].over_allocated);
    }

    #[test]
    fn test_assignment_window_limits_days() {
        let mut windowed = assign("a", "r", 100.0);
        windowed.window_start = Some(d(2025, 1, 7));
        windowed.window_end = Some(d(2025, 1, 7));
        let snap = snapshot(vec![task("a", 3.0)], vec![windowed], vec![]);
        let f = fixture(&snap).unwrap();
        let timeline = build(&f, &[timing(0, 3)]);

        assert!(timeline.bucket(0, 0).is_none());
        assert!(timeline.bucket(0, 1).is_some());
        assert!(timeline.bucket(0, 2).is_none());
    }

    #[test]
    fn test_day_dates_follow_working_days() {
        let mut snap = snapshot(vec![], vec![], vec![]);
        snap.calendar.holidays = vec![d(2025, 1, 8)];
        let f = fixture(&snap).unwrap();
        let mut dates = DayDates::default();

        // Friday, then Monday after the weekend; the holiday is skipped
        assert_eq!(dates.date(&f.axis, 3).unwrap(), d(2025, 1, 10));
        assert_eq!(dates.date(&f.axis, 4).unwrap(), d(2025, 1, 13));
        assert_eq!(dates.date(&f.axis, 2).unwrap(), d(2025, 1, 9));
        assert_eq!(dates.date(&f.axis, -1).unwrap(), d(2025, 1, 3));
        for day in [-1, 0, 1, 2, 3, 4] {
            assert_eq!(
                dates.date(&f.axis, day).unwrap(),
                f.axis.day_date(day).unwrap()
            );
        }
    }

    #[test]
    fn test_day_end() {
        let f = fixture(&snapshot(vec![], vec![], vec![])).unwrap();
        assert_eq!(day_end(&f.axis, 0), 480);
        assert_eq!(day_end(&f.axis, 2), 1440);
    }
}
