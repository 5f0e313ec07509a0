//! Named build targets and their execution order
//!
//! Targets declare hard dependencies (`depends_on`) and soft ordering hints
//! (`before` / `after`). [`TargetGraph::resolve`] turns a requested target into
//! a linear plan and [`runner::execute`] runs that plan fail-fast.

pub mod graph;
pub mod runner;

pub use graph::{Target, TargetGraph};
pub use runner::{execute, ExecutionReport, TargetStatus};
