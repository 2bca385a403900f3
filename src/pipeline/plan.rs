// src/pipeline/plan.rs

//! Execution order of pipeline steps.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::Direction;
use petgraph::graphmap::DiGraphMap;

use crate::config::ConfigFile;
use crate::errors::{Result, SteprunError};

/// Ordered list of step names to run.
///
/// Every step comes after all of its `after` dependencies. Among steps
/// whose dependencies are satisfied, declaration order wins, so a file
/// without any `after` runs top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    steps: Vec<String>,
}

impl ExecutionPlan {
    /// Plan covering every step in the file.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        build(cfg, None)
    }

    /// Plan covering `target` and its transitive dependencies only.
    pub fn for_target(cfg: &ConfigFile, target: &str) -> Result<Self> {
        build(cfg, Some(target))
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn contains(&self, name: &str) -> bool {
        self.steps.iter().any(|s| s == name)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn build(cfg: &ConfigFile, target: Option<&str>) -> Result<ExecutionPlan> {
    let steps = cfg.steps();
    let index: HashMap<&str, usize> = steps
        .iter()
        .enumerate()
        .map(|(i, s)| (s.name.as_str(), i))
        .collect();

    // Edge direction: dep -> step, keyed by declaration index.
    let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
    for i in 0..steps.len() {
        graph.add_node(i);
    }
    for (i, step) in steps.iter().enumerate() {
        for dep in step.after.iter() {
            let Some(&d) = index.get(dep.as_str()) else {
                return Err(SteprunError::StepNotFound(dep.clone()));
            };
            graph.add_edge(d, i, ());
        }
    }

    let selected: BTreeSet<usize> = match target {
        None => (0..steps.len()).collect(),
        Some(name) => {
            let Some(&root) = index.get(name) else {
                return Err(SteprunError::StepNotFound(name.to_string()));
            };
            ancestors_inclusive(&graph, root)
        }
    };

    let mut remaining = selected;
    let mut done: HashSet<usize> = HashSet::new();
    let mut order = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let next = remaining.iter().copied().find(|&i| {
            graph
                .neighbors_directed(i, Direction::Incoming)
                .all(|dep| done.contains(&dep))
        });

        let Some(next) = next else {
            let stuck = remaining
                .iter()
                .next()
                .map(|&i| steps[i].name.clone())
                .unwrap_or_default();
            return Err(SteprunError::DependencyCycle(format!(
                "cycle detected in step dependencies involving step '{stuck}'"
            )));
        };

        remaining.remove(&next);
        done.insert(next);
        order.push(steps[next].name.clone());
    }

    Ok(ExecutionPlan { steps: order })
}

/// `root` plus everything it depends on, directly or transitively.
fn ancestors_inclusive(graph: &DiGraphMap<usize, ()>, root: usize) -> BTreeSet<usize> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if seen.insert(node) {
            stack.extend(graph.neighbors_directed(node, Direction::Incoming));
        }
    }
    seen
}
