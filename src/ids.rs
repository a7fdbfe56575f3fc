//! Identifiers and scalar types shared across the solver.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense, run-local index assigned to a basic block at ingestion time.
///
/// Stable only within a single solver invocation: the same `BblId` may
/// refer to a different `BblHash` across two separate runs if the input
/// profiles differ.
pub type BblId = u32;

/// Cost value in nanoseconds. Always non-negative for per-site time;
/// may be used as an accumulator for sums of non-negative costs.
pub type Cost = f64;

/// 128-bit content hash identifying a basic block across profiling runs,
/// represented as a (high, low) pair of 64-bit words.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BblHash {
    pub hi: u64,
    pub lo: u64,
}

impl BblHash {
    pub const fn new(hi: u64, lo: u64) -> Self {
        BblHash { hi, lo }
    }

    /// Sentinel for code that executes outside of any annotated basic block.
    pub const GLOBAL: BblHash = BblHash::new(0, 0);

    /// Sentinel for the program's top-level basic block.
    pub const MAIN: BblHash = BblHash::new(0, 1);
}

impl fmt::Display for BblHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

/// Where a basic block executes, or a placeholder used while a strategy
/// is still deciding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CostSite {
    Cpu,
    Pim,
    /// "Inherit predecessor's site" — only meaningful in a `DecisionFromFile`
    /// before it is resolved into a concrete site.
    Follower,
    /// Not yet assigned. Forbidden in any decision handed to the cost oracle
    /// for final evaluation.
    Invalid,
}

impl CostSite {
    pub fn other(self) -> CostSite {
        match self {
            CostSite::Cpu => CostSite::Pim,
            CostSite::Pim => CostSite::Cpu,
            CostSite::Follower | CostSite::Invalid => {
                unreachable!("other() is only defined for Cpu/Pim")
            }
        }
    }

    pub fn as_letter(self) -> &'static str {
        match self {
            CostSite::Cpu => "C",
            CostSite::Pim => "P",
            CostSite::Follower => "F",
            CostSite::Invalid => "I",
        }
    }
}

impl fmt::Display for CostSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_letter())
    }
}

/// Per-site flush/fetch/switch cost table (nanoseconds), plus the
/// strategy-wide thresholds that apply regardless of which strategy runs.
#[derive(Clone, Debug)]
pub struct CostConfig {
    pub flush_cpu: Cost,
    pub flush_pim: Cost,
    pub fetch_cpu: Cost,
    pub fetch_pim: Cost,
    pub switch_cpu: Cost,
    pub switch_pim: Cost,
    pub mpki_threshold: f64,
    pub parallelism_threshold: usize,
    pub batch_threshold: f64,
    pub batch_size: usize,
    pub data_move_threshold: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        CostConfig {
            flush_cpu: 60.0,
            flush_pim: 30.0,
            fetch_cpu: 60.0,
            fetch_pim: 30.0,
            switch_cpu: 800.0,
            switch_pim: 800.0,
            mpki_threshold: 5.0,
            parallelism_threshold: 15,
            batch_threshold: 0.001,
            batch_size: 10,
            data_move_threshold: 0.5,
        }
    }
}

impl CostConfig {
    pub fn flush(&self, site: CostSite) -> Cost {
        match site {
            CostSite::Cpu => self.flush_cpu,
            CostSite::Pim => self.flush_pim,
            _ => unreachable!("flush() is only defined for Cpu/Pim"),
        }
    }

    pub fn fetch(&self, site: CostSite) -> Cost {
        match site {
            CostSite::Cpu => self.fetch_cpu,
            CostSite::Pim => self.fetch_pim,
            _ => unreachable!("fetch() is only defined for Cpu/Pim"),
        }
    }

    pub fn switch(&self, site: CostSite) -> Cost {
        match site {
            CostSite::Cpu => self.switch_cpu,
            CostSite::Pim => self.switch_pim,
            _ => unreachable!("switch() is only defined for Cpu/Pim"),
        }
    }

    /// The maximum cost a single reuse segment could possibly contribute,
    /// used as the leaf importance multiplier (§4.2).
    pub fn single_segment_max_reuse_cost(&self) -> Cost {
        (self.flush_cpu + self.fetch_pim).max(self.flush_pim + self.fetch_cpu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bblhash_ordering_is_lexicographic() {
        let a = BblHash::new(1, 5);
        let b = BblHash::new(1, 9);
        let c = BblHash::new(2, 0);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn cost_site_other_swaps() {
        assert_eq!(CostSite::Cpu.other(), CostSite::Pim);
        assert_eq!(CostSite::Pim.other(), CostSite::Cpu);
    }

    #[test]
    fn single_segment_max_reuse_cost_matches_spec_default() {
        let cfg = CostConfig::default();
        assert_eq!(cfg.single_segment_max_reuse_cost(), 90.0);
    }
}
