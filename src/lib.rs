//! PIMProf's offline CostSolver: decides whether each basic block of a
//! previously profiled program should execute on a conventional CPU or
//! a Processing-In-Memory (PIM) unit, minimizing total wall-clock time
//! under a cost model covering per-site execution time, cache-line
//! reuse data movement, and control-flow switch overhead.

pub mod annotate;
pub mod cost;
pub mod disjoint_set;
pub mod error;
pub mod ids;
pub mod parse;
pub mod report;
pub mod solver;
pub mod stats;
pub mod strategy;
pub mod switch;
pub mod trie;
