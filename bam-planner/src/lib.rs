//! Planning and ordering (C5/C6): turns a parsed batch of rows into a
//! dependency-ordered set of operations the executor can run.

mod containment;
mod diff;
mod graph;
pub mod type_map;

pub use diff::{PlanError, PlanOutcome, Planner, UpdateMode};
pub use graph::DependencyGraph;
