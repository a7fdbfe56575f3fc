//! Site-assignment strategies (§4.4–§4.8 of the design): MPKI, Greedy,
//! Reuse (batched permutation search + local refinement), and SCA
//! (parameter sweep + cache-line-traffic coalescing). Each strategy is a
//! plain function over the shared input tuple (aligned stats, reuse
//! trie, switch table, config) returning a fully-resolved `Decision`;
//! the solver evaluates every decision against the same cost oracle so
//! the reporter can compare them uniformly.

pub mod greedy;
pub mod mpki;
pub mod reuse;
pub mod sca;
