//! Dependency graph (C6): a Kahn-style topological structure over
//! operations keyed by `row_id`. Construction fails loudly on a cycle;
//! `complete` is the executor's only way to discover newly-unblocked work,
//! and is safe to call concurrently.

use std::collections::HashMap;

use bam_errors::{BamError, BamResult};
use bam_model::Operation;
use parking_lot::Mutex;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

struct Inner {
    graph: DiGraph<String, ()>,
    index_of: HashMap<String, NodeIndex>,
    indegree: HashMap<NodeIndex, usize>,
}

pub struct DependencyGraph {
    inner: Mutex<Inner>,
}

impl DependencyGraph {
    /// Builds the graph from a planned operation list. Dependencies that
    /// name a row_id outside the operation list (already satisfied by a
    /// prior session, or a no-op row that never became an operation) are
    /// silently dropped rather than treated as a missing node.
    pub fn build(operations: &[Operation]) -> BamResult<Self> {
        let mut graph = DiGraph::new();
        let mut index_of = HashMap::with_capacity(operations.len());

        for op in operations {
            let index = graph.add_node(op.row_id.clone());
            index_of.insert(op.row_id.clone(), index);
        }

        for op in operations {
            let to = index_of[&op.row_id];
            for dependency in &op.dependencies {
                if let Some(&from) = index_of.get(dependency) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        if is_cyclic_directed(&graph) {
            return Err(BamError::Fatal {
                row_id: String::new(),
                message: "dependency graph contains a cycle".to_string(),
            });
        }

        let indegree = graph
            .node_indices()
            .map(|index| (index, graph.neighbors_directed(index, Direction::Incoming).count()))
            .collect();

        Ok(Self { inner: Mutex::new(Inner { graph, index_of, indegree }) })
    }

    /// The initial frontier: operations with no predecessor at all.
    pub fn ready(&self) -> Vec<String> {
        let inner = self.inner.lock();
        inner
            .indegree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(index, _)| inner.graph[*index].clone())
            .collect()
    }

    /// Marks `row_id` complete, decrementing its successors' indegree and
    /// returning those that just hit zero. Unknown row_ids (already
    /// completed on a prior call, or never part of the graph) return an
    /// empty list rather than erroring — resume logic calls this
    /// unconditionally while replaying a checkpoint.
    pub fn complete(&self, row_id: &str) -> Vec<String> {
        let mut inner = self.inner.lock();
        let Some(&index) = inner.index_of.get(row_id) else {
            return Vec::new();
        };
        let successors: Vec<NodeIndex> = inner.graph.neighbors_directed(index, Direction::Outgoing).collect();

        let mut newly_ready = Vec::new();
        for successor in successors {
            if let Some(degree) = inner.indegree.get_mut(&successor) {
                *degree -= 1;
                if *degree == 0 {
                    newly_ready.push(inner.graph[successor].clone());
                }
            }
        }
        newly_ready
    }

    /// All row_ids transitively downstream of `row_id`, used by
    /// `fail_group` to cancel only the dependent branch.
    pub fn downstream_of(&self, row_id: &str) -> Vec<String> {
        let inner = self.inner.lock();
        let Some(&start) = inner.index_of.get(row_id) else {
            return Vec::new();
        };
        let mut seen = std::collections::HashSet::new();
        let mut stack = vec![start];
        while let Some(index) = stack.pop() {
            for successor in inner.graph.neighbors_directed(index, Direction::Outgoing) {
                if seen.insert(successor) {
                    stack.push(successor);
                }
            }
        }
        seen.into_iter().map(|index| inner.graph[index].clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bam_model::ObjectType;
    use serde_json::json;

    fn op(row_id: &str, deps: &[&str]) -> Operation {
        Operation::create(row_id, ObjectType::Ip4Block, json!({})).with_dependencies(deps.iter().map(|s| s.to_string()))
    }

    #[test]
    fn roots_form_the_initial_ready_set() {
        let ops = vec![op("a", &[]), op("b", &["a"]), op("c", &["a"])];
        let graph = DependencyGraph::build(&ops).unwrap();
        let mut ready = graph.ready();
        ready.sort();
        assert_eq!(ready, vec!["a".to_string()]);
    }

    #[test]
    fn completing_a_root_unblocks_both_children() {
        let ops = vec![op("a", &[]), op("b", &["a"]), op("c", &["a"])];
        let graph = DependencyGraph::build(&ops).unwrap();
        let mut newly_ready = graph.complete("a");
        newly_ready.sort();
        assert_eq!(newly_ready, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn diamond_dependency_waits_for_both_parents() {
        let ops = vec![op("a", &[]), op("b", &["a"]), op("c", &["a"]), op("d", &["b", "c"])];
        let graph = DependencyGraph::build(&ops).unwrap();
        assert!(graph.complete("b").is_empty());
        assert_eq!(graph.complete("c"), vec!["d".to_string()]);
    }

    #[test]
    fn cycle_is_rejected_at_construction() {
        let ops = vec![op("a", &["b"]), op("b", &["a"])];
        assert!(DependencyGraph::build(&ops).is_err());
    }

    #[test]
    fn downstream_of_returns_the_transitive_dependent_set() {
        let ops = vec![op("a", &[]), op("b", &["a"]), op("c", &["b"])];
        let graph = DependencyGraph::build(&ops).unwrap();
        let mut downstream = graph.downstream_of("a");
        downstream.sort();
        assert_eq!(downstream, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn unknown_row_id_completes_as_a_no_op() {
        let ops = vec![op("a", &[])];
        let graph = DependencyGraph::build(&ops).unwrap();
        assert!(graph.complete("does-not-exist").is_empty());
    }
}
