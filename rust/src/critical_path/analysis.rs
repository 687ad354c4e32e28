//! Critical path extraction from a computed schedule.

use crate::calendar::WorkAxis;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::graph::TaskGraph;
use crate::interner::ArenaIdx;
use crate::models::{CriticalPathReport, NearCriticalTask};
use crate::scheduler::{edge_slack, ScheduleState};
use crate::log_checks;

/// Enumerates chains of critical tasks linked by driving dependencies.
pub struct CriticalPathAnalyzer<'a> {
    graph: &'a TaskGraph,
    axis: &'a WorkAxis,
    config: &'a EngineConfig,
}

impl<'a> CriticalPathAnalyzer<'a> {
    pub fn new(graph: &'a TaskGraph, axis: &'a WorkAxis, config: &'a EngineConfig) -> Self {
        Self {
            graph,
            axis,
            config,
        }
    }

    fn within_tolerance(&self, minutes: i64) -> bool {
        self.axis.to_days(minutes) <= self.config.critical_tolerance_days
    }

    /// Build the report for `state`.
    ///
    /// A path starts at a critical task with no driving critical predecessor and
    /// follows driving edges until a task with no driving critical successor.
    /// Enumeration stops after `max_critical_paths` paths.
    pub fn analyze(&self, state: &ScheduleState) -> Result<CriticalPathReport, EngineError> {
        let graph = self.graph;
        let n = graph.len();
        let critical: Vec<bool> = (0..n)
            .map(|i| state.critical[i] && !graph.is_summary(i))
            .collect();

        let mut driving: Vec<Vec<ArenaIdx>> = vec![Vec::new(); n];
        let mut has_driver = vec![false; n];
        for &idx in graph.topo_order() {
            if !critical[idx] {
                continue;
            }
            let mut next: Vec<ArenaIdx> = graph
                .successors(idx)
                .iter()
                .filter(|edge| critical[edge.task])
                .filter(|edge| {
                    self.within_tolerance(edge_slack(
                        edge,
                        &state.timings[idx],
                        &state.timings[edge.task],
                    ))
                })
                .map(|edge| edge.task)
                .collect();
            // Summary expansion can produce parallel edges between the same pair
            next.sort_by_key(|&t| graph.topo_position(t));
            next.dedup();
            for &t in &next {
                has_driver[t] = true;
            }
            driving[idx] = next;
        }

        let sources: Vec<ArenaIdx> = graph
            .topo_order()
            .iter()
            .copied()
            .filter(|&i| critical[i] && !has_driver[i])
            .collect();

        let (paths, truncated) = self.enumerate_paths(&sources, &driving);
        log_checks!(
            self.config.verbosity,
            "Found {} critical paths from {} sources (truncated: {})",
            paths.len(),
            sources.len(),
            truncated
        );

        let tolerance = self.config.critical_tolerance_days;
        let threshold = self.config.near_critical_threshold_days;
        let mut near: Vec<(f64, ArenaIdx)> = graph
            .topo_order()
            .iter()
            .map(|&i| (self.axis.to_days(state.total_float[i]), i))
            .filter(|&(float, _)| float > tolerance && float <= threshold)
            .collect();
        near.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        Ok(CriticalPathReport {
            paths: paths
                .into_iter()
                .map(|path| path.into_iter().map(|i| graph.id(i).to_string()).collect())
                .collect(),
            critical_task_ids: (0..n)
                .filter(|&i| critical[i])
                .map(|i| graph.id(i).to_string())
                .collect(),
            near_critical: near
                .into_iter()
                .map(|(float, i)| NearCriticalTask {
                    task_id: graph.id(i).to_string(),
                    total_float_days: float,
                })
                .collect(),
            project_duration_days: self.axis.to_days(state.project_finish),
            project_finish: self.axis.finish_instant(state.project_finish)?,
            truncated,
        })
    }

    /// Depth-first enumeration from each source; returns whether the cap was hit.
    fn enumerate_paths(
        &self,
        sources: &[ArenaIdx],
        driving: &[Vec<ArenaIdx>],
    ) -> (Vec<Vec<ArenaIdx>>, bool) {
        let max_paths = self.config.max_critical_paths;
        let mut paths: Vec<Vec<ArenaIdx>> = Vec::new();

        for &source in sources {
            // (task, index of the next successor to visit)
            let mut stack: Vec<(ArenaIdx, usize)> = vec![(source, 0)];
            while let Some(top) = stack.last_mut() {
                let (task, next) = *top;
                let successors = &driving[task];
                if successors.is_empty() {
                    if paths.len() >= max_paths {
                        return (paths, true);
                    }
                    paths.push(stack.iter().map(|&(t, _)| t).collect());
                    stack.pop();
                } else if next < successors.len() {
                    top.1 += 1;
                    stack.push((successors[next], 0));
                } else {
                    stack.pop();
                }
            }
        }

        (paths, false)
    }
}
