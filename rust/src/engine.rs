//! Entry point tying the calendar, graph, scheduler, analyzer and leveler together.
//!
//! A `SchedulingEngine` is built from one immutable snapshot and owns all data
//! derived from it, so independent engines can run on separate threads.

use chrono::NaiveDate;

use crate::calendar::{WorkAxis, WorkingCalendar};
use crate::config::EngineConfig;
use crate::critical_path::CriticalPathAnalyzer;
use crate::error::EngineError;
use crate::graph::TaskGraph;
use crate::leveling::{ResourceLevelingEngine, ResourcePool};
use crate::models::{CriticalPathReport, EngineOutput, LevelingResult, ProjectSnapshot, Schedule};
use crate::scheduler::{ForwardBackwardScheduler, ScheduleState};
use crate::{log_changes, log_checks};

pub struct SchedulingEngine {
    config: EngineConfig,
    graph: TaskGraph,
    axis: WorkAxis,
    pool: ResourcePool,
    deadline: Option<NaiveDate>,
}

impl SchedulingEngine {
    /// Validate `snapshot` and derive everything the computations share.
    ///
    /// Structural problems (cycles, dangling references, unusable calendars,
    /// bad assignments) are reported here; nothing later fails on them.
    pub fn new(snapshot: &ProjectSnapshot, config: &EngineConfig) -> Result<Self, EngineError> {
        let calendar = WorkingCalendar::new(&snapshot.calendar, config.max_calendar_scan_days)?;
        let graph = TaskGraph::build(&snapshot.tasks, &snapshot.dependencies, &calendar)?;
        let pool = ResourcePool::build(
            snapshot,
            &graph,
            &calendar,
            config.max_calendar_scan_days,
        )?;
        let axis = WorkAxis::new(calendar, snapshot.project_start)?;

        log_checks!(
            config.verbosity,
            "Built graph with {} tasks, {} edges, {} resources",
            graph.len(),
            graph.edge_count(),
            pool.profiles.len()
        );

        Ok(Self {
            config: config.clone(),
            graph,
            axis,
            pool,
            deadline: snapshot.deadline,
        })
    }

    fn scheduler(&self) -> ForwardBackwardScheduler<'_> {
        ForwardBackwardScheduler::new(&self.graph, &self.axis, self.deadline, &self.config)
    }

    fn analyze(&self, state: &ScheduleState) -> Result<CriticalPathReport, EngineError> {
        CriticalPathAnalyzer::new(&self.graph, &self.axis, &self.config).analyze(state)
    }

    /// Early/late dates, float and constraint conflicts.
    pub fn schedule(&self) -> Result<Schedule, EngineError> {
        let scheduler = self.scheduler();
        scheduler.render(&scheduler.compute())
    }

    pub fn critical_path(&self) -> Result<CriticalPathReport, EngineError> {
        self.analyze(&self.scheduler().compute())
    }

    /// Level resources against the unleveled schedule.
    pub fn level(&self) -> Result<LevelingResult, EngineError> {
        let scheduler = self.scheduler();
        let baseline = scheduler.compute();
        ResourceLevelingEngine::new(&scheduler, &self.pool).level(&baseline)
    }

    /// Schedule, critical path and (when enabled) leveling from a single pass.
    pub fn run(&self) -> Result<EngineOutput, EngineError> {
        let scheduler = self.scheduler();
        let state = scheduler.compute();
        let schedule = scheduler.render(&state)?;
        let critical_path = self.analyze(&state)?;

        let leveling = if self.config.level_resources {
            Some(ResourceLevelingEngine::new(&scheduler, &self.pool).level(&state)?)
        } else {
            None
        };

        log_changes!(
            self.config.verbosity,
            "Scheduled {} tasks over {:.2} working days ({} conflicts, {} critical paths)",
            schedule.entries.len(),
            schedule.project_duration_days,
            schedule.conflicts.len(),
            critical_path.paths.len()
        );

        Ok(EngineOutput {
            schedule,
            critical_path,
            leveling,
        })
    }
}
