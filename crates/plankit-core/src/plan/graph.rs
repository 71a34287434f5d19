//! Store-wide plan validation.
//!
//! Per-file checks happen at load time. This module checks the things only
//! visible across the whole plans directory:
//! - Plan ids are unique.
//! - `dependencies` and `parent` reference existing ids.
//! - The dependency graph is acyclic (topological sort).

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use plankit_store::PlanRecord;

/// Problems found across the plans directory.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("plan id {id} is used by more than one file: {paths}")]
    DuplicateId { id: u64, paths: String },

    #[error("plan {plan} depends on unknown plan {dependency}")]
    UnknownDependency { plan: String, dependency: u64 },

    #[error("plan {plan} has unknown parent {parent}")]
    UnknownParent { plan: String, parent: u64 },

    #[error("dependency cycle detected involving plans: {0}")]
    CycleDetected(String),
}

/// Validate the plans of one store against each other.
///
/// Returns every problem found; an empty list means the store is
/// consistent. Plans whose id is duplicated are still checked for unknown
/// references but are left out of the cycle check.
pub fn validate_plan_graph(plans: &[(PathBuf, Arc<PlanRecord>)]) -> Vec<GraphError> {
    let mut errors = Vec::new();

    // Group file positions by id, in order of first appearance.
    let mut by_id: HashMap<u64, Vec<usize>> = HashMap::new();
    let mut id_order: Vec<u64> = Vec::new();
    for (idx, (_, plan)) in plans.iter().enumerate() {
        let Some(id) = plan.id else { continue };
        let slots = by_id.entry(id).or_default();
        if slots.is_empty() {
            id_order.push(id);
        }
        slots.push(idx);
    }
    for id in &id_order {
        let slots = &by_id[id];
        if slots.len() > 1 {
            let paths: Vec<String> = slots
                .iter()
                .map(|&i| plans[i].0.display().to_string())
                .collect();
            errors.push(GraphError::DuplicateId {
                id: *id,
                paths: paths.join(", "),
            });
        }
    }

    // Check references.
    for (path, plan) in plans {
        let name = || match plan.id {
            Some(id) => id.to_string(),
            None => path.display().to_string(),
        };
        for dep in &plan.dependencies {
            if !by_id.contains_key(dep) {
                errors.push(GraphError::UnknownDependency {
                    plan: name(),
                    dependency: *dep,
                });
            }
        }
        if let Some(parent) = plan.parent {
            if !by_id.contains_key(&parent) {
                errors.push(GraphError::UnknownParent {
                    plan: name(),
                    parent,
                });
            }
        }
    }

    let unique: HashMap<u64, usize> = by_id
        .iter()
        .filter(|(_, slots)| slots.len() == 1)
        .map(|(id, slots)| (*id, slots[0]))
        .collect();
    if let Err(e) = check_for_cycles(plans, &unique) {
        errors.push(e);
    }
    errors
}

/// Detect dependency cycles using Kahn's algorithm.
///
/// Only plans in `id_to_idx` (unique ids) take part. Edges to unknown or
/// duplicated ids are ignored; those are reported separately.
fn check_for_cycles(
    plans: &[(PathBuf, Arc<PlanRecord>)],
    id_to_idx: &HashMap<u64, usize>,
) -> Result<(), GraphError> {
    let n = plans.len();
    let mut in_degree = vec![0usize; n];
    let mut adj: Vec<Vec<usize>> = vec![vec![]; n];

    for &plan_idx in id_to_idx.values() {
        for dep in &plans[plan_idx].1.dependencies {
            let Some(&dep_idx) = id_to_idx.get(dep) else {
                continue;
            };
            // Edge: dep -> plan (dep must finish first).
            adj[dep_idx].push(plan_idx);
            in_degree[plan_idx] += 1;
        }
    }

    let mut queue: VecDeque<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, deg)| **deg == 0)
        .map(|(i, _)| i)
        .collect();

    let mut sorted_count = 0usize;
    while let Some(node) = queue.pop_front() {
        sorted_count += 1;
        for &neighbor in &adj[node] {
            in_degree[neighbor] -= 1;
            if in_degree[neighbor] == 0 {
                queue.push_back(neighbor);
            }
        }
    }

    if sorted_count != n {
        let mut cycle_ids: Vec<u64> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, deg)| **deg > 0)
            .filter_map(|(i, _)| plans[i].1.id)
            .collect();
        cycle_ids.sort_unstable();
        let names: Vec<String> = cycle_ids.iter().map(u64::to_string).collect();
        return Err(GraphError::CycleDetected(names.join(", ")));
    }

    Ok(())
}
