//! The canonical cost oracle (§4.3, §9): `Cost = T_cpu + T_pim + ReuseCost
//! + SwitchCost`, plus the breakdown type strategies and the reporter both
//! consume.

use crate::ids::{BblId, Cost, CostConfig, CostSite};
use crate::stats::AlignedStats;
use crate::switch::SwitchCountTable;
use crate::trie::ReuseTrie;
use serde::Serialize;

/// A per-block site assignment. `Invalid` is legal while a strategy is
/// still working but must never reach [`evaluate`].
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct Decision {
    sites: Vec<CostSite>,
}

impl Decision {
    pub fn new(n: usize) -> Self {
        Decision {
            sites: vec![CostSite::Invalid; n],
        }
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn get(&self, id: BblId) -> CostSite {
        self.sites[id as usize]
    }

    pub fn set(&mut self, id: BblId, site: CostSite) {
        self.sites[id as usize] = site;
    }

    pub fn iter(&self) -> impl Iterator<Item = CostSite> + '_ {
        self.sites.iter().copied()
    }

    /// Every block has a concrete `Cpu`/`Pim` assignment — required
    /// before handing a decision to [`evaluate`] (§7, §8).
    pub fn is_fully_resolved(&self) -> bool {
        self.sites
            .iter()
            .all(|s| matches!(s, CostSite::Cpu | CostSite::Pim))
    }
}

/// The cost oracle's breakdown of a decision's total cost into its four
/// additive components (§9).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub cpu_time: Cost,
    pub pim_time: Cost,
    pub reuse_cost: Cost,
    pub switch_cost: Cost,
}

impl CostBreakdown {
    pub fn total(&self) -> Cost {
        self.cpu_time + self.pim_time + self.reuse_cost + self.switch_cost
    }
}

/// Evaluates a fully-resolved decision against aligned stats, a reuse
/// trie and a switch-count table, per the canonical formula in §9.
///
/// Panics (via the unreachable! in [`CostConfig`] site accessors) if
/// `decision` still contains `Follower`/`Invalid` entries — callers must
/// resolve those first (§4.9).
pub fn evaluate(
    decision: &Decision,
    aligned: &AlignedStats,
    trie: &ReuseTrie,
    switches: &SwitchCountTable,
    cfg: &CostConfig,
) -> CostBreakdown {
    let mut cpu_time = 0.0;
    let mut pim_time = 0.0;
    for id in 0..decision.len() as BblId {
        match decision.get(id) {
            CostSite::Cpu => cpu_time += aligned.cpu[id as usize].max_elapsed_time(),
            CostSite::Pim => pim_time += aligned.pim[id as usize].max_elapsed_time(),
            // Unresolved entries contribute nothing yet; only a final,
            // fully-resolved decision is expected to carry no Invalids at all.
            CostSite::Invalid => {}
            CostSite::Follower => unreachable!("Follower must be resolved before evaluate"),
        }
    }

    let reuse_cost = trie.reuse_cost(
        &|id: BblId| decision.get(id),
        |site| cfg.flush(site) + cfg.fetch(site.other()),
    );

    // Switch cost is charged against the *source* site of the transition
    // (§4.3); a row whose source is still unresolved contributes zero.
    let mut switch_cost = 0.0;
    for row in switches.rows() {
        let from_site = decision.get(row.from);
        if from_site == CostSite::Invalid {
            continue;
        }
        for (to, count) in row.iter() {
            let to_site = decision.get(to);
            if from_site != to_site {
                switch_cost += count as f64 * cfg.switch(from_site);
            }
        }
    }

    CostBreakdown {
        cpu_time,
        pim_time,
        reuse_cost,
        switch_cost,
    }
}
