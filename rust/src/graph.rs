//! Task dependency graph.
//!
//! Tasks live in an arena indexed by `ArenaIdx`; dependency edges are index
//! pairs stored in forward and reverse adjacency lists. Summary tasks stay in
//! the arena for rollup but carry no edges: a dependency that names a summary
//! is expanded onto the summary's leaf descendants.

use chrono::NaiveDate;
use std::collections::VecDeque;

use crate::calendar::{WorkMinutes, WorkingCalendar};
use crate::error::EngineError;
use crate::interner::{ArenaIdx, IdInterner};
use crate::models::{ConstraintKind, Dependency, DependencyType, Task, TaskKind};

/// Largest accepted task duration or lag magnitude, in working days.
pub const MAX_SPAN_DAYS: f64 = 36_500.0;

/// One end of a dependency, seen from the other end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    /// The task at the other end of the edge.
    pub task: ArenaIdx,
    pub dependency_type: DependencyType,
    pub lag: WorkMinutes,
}

/// Scheduling-relevant data of one task.
#[derive(Clone, Debug)]
pub struct TaskNode {
    pub kind: TaskKind,
    /// Working minutes; always zero for milestones and summaries.
    pub duration: WorkMinutes,
    pub constraint_kind: ConstraintKind,
    pub constraint_date: Option<NaiveDate>,
    pub parent: Option<ArenaIdx>,
    pub children: Vec<ArenaIdx>,
}

/// Validated, topologically sorted dependency graph.
#[derive(Clone, Debug)]
pub struct TaskGraph {
    index: IdInterner,
    nodes: Vec<TaskNode>,
    successors: Vec<Vec<Edge>>,
    predecessors: Vec<Vec<Edge>>,
    /// Non-summary tasks, every task after all its predecessors.
    topo_order: Vec<ArenaIdx>,
    /// Position of each task in `topo_order` (`usize::MAX` for summaries).
    topo_position: Vec<usize>,
    /// Summary tasks, children before parents.
    summary_order: Vec<ArenaIdx>,
    edge_count: usize,
}

impl TaskGraph {
    /// Build and validate the graph.
    ///
    /// Durations and lags are converted to working minutes with `calendar`.
    pub fn build(
        tasks: &[Task],
        dependencies: &[Dependency],
        calendar: &WorkingCalendar,
    ) -> Result<Self, EngineError> {
        let mut index = IdInterner::with_capacity(tasks.len());
        let mut nodes: Vec<TaskNode> = Vec::with_capacity(tasks.len());

        for task in tasks {
            if index.intern_unique(&task.id).is_none() {
                return Err(EngineError::DuplicateTask(task.id.clone()));
            }
            nodes.push(build_node(task, calendar)?);
        }

        link_parents(tasks, &index, &mut nodes)?;
        let summary_order = summary_post_order(&nodes);

        let n = nodes.len();
        let mut successors: Vec<Vec<Edge>> = vec![Vec::new(); n];
        let mut predecessors: Vec<Vec<Edge>> = vec![Vec::new(); n];
        let mut edge_count = 0;

        for dep in dependencies {
            let resolve = |id: &str| {
                index.get(id).ok_or_else(|| EngineError::DanglingDependency {
                    predecessor: dep.predecessor_id.clone(),
                    successor: dep.successor_id.clone(),
                    missing: id.to_string(),
                })
            };
            let pred = resolve(&dep.predecessor_id)?;
            let succ = resolve(&dep.successor_id)?;

            if pred == succ {
                return Err(EngineError::CircularDependency {
                    task_ids: vec![dep.predecessor_id.clone()],
                });
            }
            if is_ancestor(&nodes, pred, succ) || is_ancestor(&nodes, succ, pred) {
                return Err(EngineError::CircularDependency {
                    task_ids: vec![dep.predecessor_id.clone(), dep.successor_id.clone()],
                });
            }
            if !dep.lag_days.is_finite() || dep.lag_days.abs() > MAX_SPAN_DAYS {
                return Err(EngineError::InvalidLag {
                    predecessor: dep.predecessor_id.clone(),
                    successor: dep.successor_id.clone(),
                    lag_days: dep.lag_days,
                });
            }

            let lag = calendar.days_to_minutes(dep.lag_days);
            let pred_leaves = leaves(&nodes, pred);
            let succ_leaves = leaves(&nodes, succ);
            let empty = if pred_leaves.is_empty() {
                Some(&dep.predecessor_id)
            } else if succ_leaves.is_empty() {
                Some(&dep.successor_id)
            } else {
                None
            };
            if let Some(summary_id) = empty {
                return Err(EngineError::EmptySummaryDependency {
                    predecessor: dep.predecessor_id.clone(),
                    successor: dep.successor_id.clone(),
                    summary_id: summary_id.clone(),
                });
            }
            for &p in &pred_leaves {
                for &s in &succ_leaves {
                    successors[p].push(Edge {
                        task: s,
                        dependency_type: dep.dependency_type,
                        lag,
                    });
                    predecessors[s].push(Edge {
                        task: p,
                        dependency_type: dep.dependency_type,
                        lag,
                    });
                    edge_count += 1;
                }
            }
        }

        let topo_order = topological_sort(&nodes, &successors, &predecessors)
            .map_err(|cycle| EngineError::CircularDependency {
                task_ids: cycle.into_iter().map(|i| index.resolve(i).to_string()).collect(),
            })?;

        let mut topo_position = vec![usize::MAX; n];
        for (pos, &idx) in topo_order.iter().enumerate() {
            topo_position[idx] = pos;
        }

        Ok(Self {
            index,
            nodes,
            successors,
            predecessors,
            topo_order,
            topo_position,
            summary_order,
            edge_count,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn id(&self, idx: ArenaIdx) -> &str {
        self.index.resolve(idx)
    }

    pub fn idx(&self, id: &str) -> Option<ArenaIdx> {
        self.index.get(id)
    }

    pub fn node(&self, idx: ArenaIdx) -> &TaskNode {
        &self.nodes[idx]
    }

    pub fn is_summary(&self, idx: ArenaIdx) -> bool {
        self.nodes[idx].kind == TaskKind::Summary
    }

    pub fn successors(&self, idx: ArenaIdx) -> &[Edge] {
        &self.successors[idx]
    }

    pub fn predecessors(&self, idx: ArenaIdx) -> &[Edge] {
        &self.predecessors[idx]
    }

    pub fn topo_order(&self) -> &[ArenaIdx] {
        &self.topo_order
    }

    pub fn topo_position(&self, idx: ArenaIdx) -> usize {
        self.topo_position[idx]
    }

    pub fn summary_order(&self) -> &[ArenaIdx] {
        &self.summary_order
    }

    /// Non-summary tasks reachable from `from` (excluding `from`), in topological order.
    pub fn downstream_of(&self, from: ArenaIdx) -> Vec<ArenaIdx> {
        let mut seen = vec![false; self.len()];
        let mut stack = vec![from];
        while let Some(idx) = stack.pop() {
            for edge in &self.successors[idx] {
                if !seen[edge.task] {
                    seen[edge.task] = true;
                    stack.push(edge.task);
                }
            }
        }
        let mut result: Vec<ArenaIdx> = (0..self.len()).filter(|&i| seen[i]).collect();
        result.sort_by_key(|&i| self.topo_position[i]);
        result
    }
}

fn build_node(task: &Task, calendar: &WorkingCalendar) -> Result<TaskNode, EngineError> {
    let duration = match task.kind {
        TaskKind::Task => {
            if !task.duration_days.is_finite()
                || task.duration_days < 0.0
                || task.duration_days > MAX_SPAN_DAYS
            {
                return Err(EngineError::InvalidDuration {
                    task_id: task.id.clone(),
                    duration_days: task.duration_days,
                });
            }
            calendar.days_to_minutes(task.duration_days)
        }
        TaskKind::Milestone | TaskKind::Summary => 0,
    };

    if task.kind != TaskKind::Summary
        && task.constraint_kind.requires_date()
        && task.constraint_date.is_none()
    {
        return Err(EngineError::MissingConstraintDate(task.id.clone()));
    }

    Ok(TaskNode {
        kind: task.kind,
        duration,
        constraint_kind: task.constraint_kind,
        constraint_date: task.constraint_date,
        parent: None,
        children: Vec::new(),
    })
}

/// Resolve parent references and reject non-summary parents and hierarchy cycles.
fn link_parents(
    tasks: &[Task],
    index: &IdInterner,
    nodes: &mut [TaskNode],
) -> Result<(), EngineError> {
    for (idx, task) in tasks.iter().enumerate() {
        let Some(parent_id) = &task.parent_id else {
            continue;
        };
        let parent = index
            .get(parent_id)
            .ok_or_else(|| EngineError::UnknownParent {
                task_id: task.id.clone(),
                parent_id: parent_id.clone(),
            })?;
        if nodes[parent].kind != TaskKind::Summary {
            return Err(EngineError::InvalidParent {
                task_id: task.id.clone(),
                parent_id: parent_id.clone(),
            });
        }
        nodes[idx].parent = Some(parent);
        nodes[parent].children.push(idx);
    }

    for (idx, task) in tasks.iter().enumerate() {
        let mut current = nodes[idx].parent;
        let mut steps = 0;
        while let Some(p) = current {
            steps += 1;
            if p == idx || steps > nodes.len() {
                return Err(EngineError::CircularHierarchy(task.id.clone()));
            }
            current = nodes[p].parent;
        }
    }

    Ok(())
}

/// Whether `ancestor` is a (transitive) parent of `idx`.
fn is_ancestor(nodes: &[TaskNode], ancestor: ArenaIdx, idx: ArenaIdx) -> bool {
    let mut current = nodes[idx].parent;
    while let Some(p) = current {
        if p == ancestor {
            return true;
        }
        current = nodes[p].parent;
    }
    false
}

/// Non-summary tasks under `idx` (or `idx` itself when it is not a summary).
fn leaves(nodes: &[TaskNode], idx: ArenaIdx) -> Vec<ArenaIdx> {
    let mut result = Vec::new();
    let mut stack = vec![idx];
    while let Some(current) = stack.pop() {
        let node = &nodes[current];
        if node.kind == TaskKind::Summary {
            stack.extend(node.children.iter().rev().copied());
        } else {
            result.push(current);
        }
    }
    result
}

/// Summaries ordered so every summary comes after its summary descendants.
fn summary_post_order(nodes: &[TaskNode]) -> Vec<ArenaIdx> {
    fn visit(nodes: &[TaskNode], idx: ArenaIdx, out: &mut Vec<ArenaIdx>) {
        for &child in &nodes[idx].children {
            visit(nodes, child, out);
        }
        if nodes[idx].kind == TaskKind::Summary {
            out.push(idx);
        }
    }

    let mut order = Vec::new();
    for (idx, node) in nodes.iter().enumerate() {
        if node.parent.is_none() {
            visit(nodes, idx, &mut order);
        }
    }
    order
}

/// Kahn's algorithm over non-summary tasks.
///
/// On failure returns the tasks that lie on a cycle: the Kahn remainder with
/// everything that merely hangs off a cycle pruned away.
fn topological_sort(
    nodes: &[TaskNode],
    successors: &[Vec<Edge>],
    predecessors: &[Vec<Edge>],
) -> Result<Vec<ArenaIdx>, Vec<ArenaIdx>> {
    let schedulable: Vec<ArenaIdx> = (0..nodes.len())
        .filter(|&i| nodes[i].kind != TaskKind::Summary)
        .collect();

    let mut in_degree: Vec<usize> = predecessors.iter().map(|p| p.len()).collect();
    let mut queue: VecDeque<ArenaIdx> = schedulable
        .iter()
        .copied()
        .filter(|&i| in_degree[i] == 0)
        .collect();

    let mut order = Vec::with_capacity(schedulable.len());
    while let Some(idx) = queue.pop_front() {
        order.push(idx);
        for edge in &successors[idx] {
            in_degree[edge.task] -= 1;
            if in_degree[edge.task] == 0 {
                queue.push_back(edge.task);
            }
        }
    }

    if order.len() == schedulable.len() {
        return Ok(order);
    }

    // Peel off remainder tasks that cannot reach back into a cycle
    let mut remaining: Vec<bool> = vec![false; nodes.len()];
    for &idx in &schedulable {
        remaining[idx] = in_degree[idx] > 0;
    }
    let mut out_degree: Vec<usize> = (0..nodes.len())
        .map(|i| {
            if remaining[i] {
                successors[i].iter().filter(|e| remaining[e.task]).count()
            } else {
                0
            }
        })
        .collect();
    let mut sinks: VecDeque<ArenaIdx> = (0..nodes.len())
        .filter(|&i| remaining[i] && out_degree[i] == 0)
        .collect();
    while let Some(idx) = sinks.pop_front() {
        remaining[idx] = false;
        for edge in &predecessors[idx] {
            if remaining[edge.task] {
                out_degree[edge.task] -= 1;
                if out_degree[edge.task] == 0 {
                    sinks.push_back(edge.task);
                }
            }
        }
    }

    Err((0..nodes.len()).filter(|&i| remaining[i]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Calendar;

    fn calendar() -> WorkingCalendar {
        WorkingCalendar::new(&Calendar::default(), 3660).unwrap()
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

    fn summary(id: &str) -> Task {
        Task::new(
            id.to_string(),
            0.0,
            TaskKind::Summary,
            ConstraintKind::AsSoonAsPossible,
            None,
            None,
        )
    }

    fn child(id: &str, duration: f64, parent: &str) -> Task {
        let mut t = task(id, duration);
        t.parent_id = Some(parent.to_string());
        t
    }

    fn fs(pred: &str, succ: &str) -> Dependency {
        Dependency::new(
            pred.to_string(),
            succ.to_string(),
            DependencyType::FinishToStart,
            0.0,
        )
    }

    fn ids(graph: &TaskGraph, order: &[ArenaIdx]) -> Vec<String> {
        order.iter().map(|&i| graph.id(i).to_string()).collect()
    }

    #[test]
    fn test_build_chain() {
        let tasks = vec![task("c", 1.0), task("b", 2.0), task("a", 3.0)];
        let deps = vec![fs("a", "b"), fs("b", "c")];
        let graph = TaskGraph::build(&tasks, &deps, &calendar()).unwrap();

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(ids(&graph, graph.topo_order()), vec!["a", "b", "c"]);
        let a = graph.idx("a").unwrap();
        assert_eq!(graph.node(a).duration, 3 * 480);
        assert_eq!(graph.successors(a).len(), 1);
        assert_eq!(graph.predecessors(a).len(), 0);
    }

    #[test]
    fn test_lag_converted_to_minutes() {
        let tasks = vec![task("a", 1.0), task("b", 1.0)];
        let deps = vec![Dependency::new(
            "a".to_string(),
            "b".to_string(),
            DependencyType::StartToStart,
            -0.5,
        )];
        let graph = TaskGraph::build(&tasks, &deps, &calendar()).unwrap();
        let edge = graph.successors(graph.idx("a").unwrap())[0];
        assert_eq!(edge.lag, -240);
        assert_eq!(edge.dependency_type, DependencyType::StartToStart);
    }

    #[test]
    fn test_cycle_names_only_cycle_members() {
        let tasks = vec![
            task("upstream", 1.0),
            task("a", 1.0),
            task("b", 1.0),
            task("c", 1.0),
            task("downstream", 1.0),
        ];
        let deps = vec![
            fs("upstream", "a"),
            fs("a", "b"),
            fs("b", "c"),
            fs("c", "a"),
            fs("c", "downstream"),
        ];
        let err = TaskGraph::build(&tasks, &deps, &calendar()).unwrap_err();
        assert_eq!(
            err,
            EngineError::CircularDependency {
                task_ids: vec!["a".to_string(), "b".to_string(), "c".to_string()]
            }
        );
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let tasks = vec![task("a", 1.0)];
        let err = TaskGraph::build(&tasks, &[fs("a", "a")], &calendar()).unwrap_err();
        assert_eq!(
            err,
            EngineError::CircularDependency {
                task_ids: vec!["a".to_string()]
            }
        );
    }

    #[test]
    fn test_dangling_dependency() {
        let tasks = vec![task("a", 1.0)];
        let err = TaskGraph::build(&tasks, &[fs("a", "ghost")], &calendar()).unwrap_err();
        assert_eq!(
            err,
            EngineError::DanglingDependency {
                predecessor: "a".to_string(),
                successor: "ghost".to_string(),
                missing: "ghost".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_task() {
        let tasks = vec![task("a", 1.0), task("a", 2.0)];
        let err = TaskGraph::build(&tasks, &[], &calendar()).unwrap_err();
        assert_eq!(err, EngineError::DuplicateTask("a".to_string()));
    }

    #[test]
    fn test_invalid_duration_and_missing_constraint_date() {
        let err = TaskGraph::build(&[task("a", -1.0)], &[], &calendar()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidDuration { .. }));

        let mut pinned = task("p", 1.0);
        pinned.constraint_kind = ConstraintKind::MustStartOn;
        let err = TaskGraph::build(&[pinned], &[], &calendar()).unwrap_err();
        assert_eq!(err, EngineError::MissingConstraintDate("p".to_string()));
    }

    #[test]
    fn test_oversized_duration_and_lag_rejected() {
        let err = TaskGraph::build(&[task("a", 1e17)], &[], &calendar()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidDuration { .. }));

        let tasks = vec![task("a", 1.0), task("b", 1.0)];
        let lagged = Dependency::new(
            "a".to_string(),
            "b".to_string(),
            DependencyType::FinishToStart,
            -1e17,
        );
        let err = TaskGraph::build(&tasks, &[lagged], &calendar()).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidLag {
                predecessor: "a".to_string(),
                successor: "b".to_string(),
                lag_days: -1e17,
            }
        );

        let long = TaskGraph::build(&[task("a", MAX_SPAN_DAYS)], &[], &calendar()).unwrap();
        assert_eq!(long.node(0).duration, 36_500 * 480);
    }

    #[test]
    fn test_dependency_on_empty_summary_rejected() {
        let tasks = vec![summary("phase"), task("a", 1.0)];
        let err = TaskGraph::build(&tasks, &[fs("phase", "a")], &calendar()).unwrap_err();
        assert_eq!(
            err,
            EngineError::EmptySummaryDependency {
                predecessor: "phase".to_string(),
                successor: "a".to_string(),
                summary_id: "phase".to_string(),
            }
        );
    }

    #[test]
    fn test_milestone_has_zero_duration() {
        let mut m = task("m", 3.0);
        m.kind = TaskKind::Milestone;
        let graph = TaskGraph::build(&[m], &[], &calendar()).unwrap();
        assert_eq!(graph.node(0).duration, 0);
    }

    #[test]
    fn test_summary_dependencies_expand_to_leaves() {
        let tasks = vec![
            summary("phase"),
            child("design", 2.0, "phase"),
            child("build", 3.0, "phase"),
            task("launch", 1.0),
        ];
        let deps = vec![fs("phase", "launch")];
        let graph = TaskGraph::build(&tasks, &deps, &calendar()).unwrap();

        let phase = graph.idx("phase").unwrap();
        let launch = graph.idx("launch").unwrap();
        assert!(graph.successors(phase).is_empty());
        let preds: Vec<&str> = graph
            .predecessors(launch)
            .iter()
            .map(|e| graph.id(e.task))
            .collect();
        assert_eq!(preds, vec!["design", "build"]);
        assert_eq!(ids(&graph, graph.summary_order()), vec!["phase"]);
        assert!(!graph.topo_order().contains(&phase));
    }

    #[test]
    fn test_nested_summary_order() {
        let tasks = vec![
            summary("outer"),
            {
                let mut inner = summary("inner");
                inner.parent_id = Some("outer".to_string());
                inner
            },
            child("work", 1.0, "inner"),
        ];
        let graph = TaskGraph::build(&tasks, &[], &calendar()).unwrap();
        assert_eq!(ids(&graph, graph.summary_order()), vec!["inner", "outer"]);
    }

    #[test]
    fn test_dependency_between_summary_and_descendant_rejected() {
        let tasks = vec![summary("phase"), child("design", 2.0, "phase")];
        let err = TaskGraph::build(&tasks, &[fs("phase", "design")], &calendar()).unwrap_err();
        assert!(matches!(err, EngineError::CircularDependency { .. }));
    }

    #[test]
    fn test_parent_errors() {
        let err = TaskGraph::build(&[child("a", 1.0, "nope")], &[], &calendar()).unwrap_err();
        assert!(matches!(err, EngineError::UnknownParent { .. }));

        let tasks = vec![task("plain", 1.0), child("a", 1.0, "plain")];
        let err = TaskGraph::build(&tasks, &[], &calendar()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParent { .. }));

        let mut x = summary("x");
        x.parent_id = Some("y".to_string());
        let mut y = summary("y");
        y.parent_id = Some("x".to_string());
        let err = TaskGraph::build(&[x, y], &[], &calendar()).unwrap_err();
        assert!(matches!(err, EngineError::CircularHierarchy(_)));
    }

    #[test]
    fn test_downstream_of() {
        let tasks = vec![task("a", 1.0), task("b", 1.0), task("c", 1.0), task("d", 1.0)];
        let deps = vec![fs("a", "b"), fs("b", "c"), fs("a", "c")];
        let graph = TaskGraph::build(&tasks, &deps, &calendar()).unwrap();
        let down = graph.downstream_of(graph.idx("a").unwrap());
        assert_eq!(ids(&graph, &down), vec!["b", "c"]);
    }
}
