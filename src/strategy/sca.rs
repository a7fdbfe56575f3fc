//! SCA strategy (§4.7, §4.8): a brute-force grid sweep over the MPKI
//! gate's three parameters, keeping whichever point the cost oracle
//! scores lowest, followed by a cache-line-traffic coalescing pass that
//! merges tightly-coupled blocks onto a single site by majority vote.

use crate::cost::{evaluate, CostBreakdown, Decision};
use crate::disjoint_set::DisjointSet;
use crate::ids::{BblId, Cost, CostConfig, CostSite};
use crate::stats::AlignedStats;
use crate::strategy::mpki::decide_with_thresholds;
use crate::switch::SwitchCountTable;
use crate::trie::ReuseTrie;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug)]
pub struct ScaParams {
    pub mpki_threshold: f64,
    pub parallelism_threshold: usize,
    pub instr_fraction: f64,
}

pub struct SweepResult {
    pub decision: Decision,
    pub breakdown: CostBreakdown,
    pub params: ScaParams,
}

/// Grid: `mpki_threshold` in steps of 10 up to 90, `parallelism_threshold`
/// 0..=9, `instr_fraction` in steps of 0.002 up to 0.018 — 10*10*10 = 1000
/// combinations, each scored by the full cost oracle against `trie` and
/// `switches` so reuse and switch overhead are accounted for even though
/// the gate itself only looks at per-block stats.
pub fn sweep(
    aligned: &AlignedStats,
    trie: &ReuseTrie,
    switches: &SwitchCountTable,
    cfg: &CostConfig,
) -> SweepResult {
    let pim_total_instr = aligned.total_instructions_pim() as f64;
    let mut best: Option<SweepResult> = None;

    for mpki_step in 0..10 {
        let mpki_threshold = mpki_step as f64 * 10.0;
        for parallelism_threshold in 0..10 {
            for instr_step in 0..10 {
                let instr_fraction = instr_step as f64 * 0.002;
                let instr_threshold = instr_fraction * pim_total_instr;

                let decision = decide_with_thresholds(
                    aligned,
                    mpki_threshold,
                    parallelism_threshold,
                    instr_threshold,
                    true,
                );
                let breakdown = evaluate(&decision, aligned, trie, switches, cfg);
                let params = ScaParams {
                    mpki_threshold,
                    parallelism_threshold,
                    instr_fraction,
                };

                let better = match &best {
                    None => true,
                    Some(b) => breakdown.total() < b.breakdown.total(),
                };
                if better {
                    best = Some(SweepResult { decision, breakdown, params });
                }
            }
        }
    }

    best.unwrap_or_else(|| SweepResult {
        decision: Decision::new(aligned.len()),
        breakdown: CostBreakdown::default(),
        params: ScaParams { mpki_threshold: 0.0, parallelism_threshold: 0, instr_fraction: 0.0 },
    })
}

/// Coalesces blocks whose combined cache-line and register data-movement
/// traffic exceeds `data_move_threshold` times the largest observed pair
/// cost, via union-find, then assigns each resulting component to PIM iff
/// at least half as many of its members already decided PIM as decided
/// otherwise (§4.8 "redecide by CL/DM").
pub fn coalesce_by_cl_dm(
    seed: &Decision,
    inter_bb_cl_dm: &BTreeMap<(BblId, BblId), u64>,
    inter_bb_reg_dm: &BTreeMap<(BblId, BblId), u64>,
    cfg: &CostConfig,
) -> Decision {
    let n = seed.len();
    if n == 0 {
        return Decision::new(0);
    }

    let mut pair_cost: BTreeMap<(BblId, BblId), Cost> = BTreeMap::new();
    for (&pair, &cl) in inter_bb_cl_dm {
        *pair_cost.entry(pair).or_insert(0.0) += cl as f64 * (cfg.flush_cpu + cfg.fetch_pim);
    }
    for (&pair, &reg) in inter_bb_reg_dm {
        *pair_cost.entry(pair).or_insert(0.0) += reg as f64 * cfg.switch_cpu;
    }

    let top = pair_cost.values().cloned().fold(0.0, Cost::max);
    let mut ds = DisjointSet::new(n);
    if top > 0.0 {
        for (&(a, b), &cost) in &pair_cost {
            if cost >= cfg.data_move_threshold * top {
                ds.union(a, b);
            }
        }
    }

    let mut decision = Decision::new(n);
    for group in ds.groups() {
        let pim_votes = group.iter().filter(|&&id| seed.get(id) == CostSite::Pim).count();
        let non_pim_votes = group.len() - pim_votes;
        let site = if pim_votes as f64 >= non_pim_votes as f64 / 2.0 {
            CostSite::Pim
        } else {
            CostSite::Cpu
        };
        for id in group {
            decision.set(id, site);
        }
    }
    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::BblHash;
    use crate::stats::{align, ingest, StatsRow};

    fn row(instr: u64, mem: u64, hash: BblHash, threads: usize) -> Vec<(usize, StatsRow)> {
        (0..threads)
            .map(|t| {
                (
                    t,
                    StatsRow {
                        bblid_at_profile_time: 0,
                        elapsed_time: 1.0,
                        instruction_count: instr,
                        memory_access: mem,
                        bblhash: hash,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn sweep_finds_some_decision_with_finite_cost() {
        let h0 = BblHash::new(0, 0);
        let h1 = BblHash::new(0, 1);
        let mut cpu_rows = row(1000, 900, h0, 20);
        cpu_rows.extend(row(1000, 10, h1, 1));
        let pim_rows = cpu_rows.clone();

        let cpu = ingest(&cpu_rows).unwrap();
        let pim = ingest(&pim_rows).unwrap();
        let aligned = align(cpu, pim);

        let trie = ReuseTrie::new();
        let switches = SwitchCountTable::new();
        let cfg = CostConfig::default();

        let result = sweep(&aligned, &trie, &switches, &cfg);
        assert!(result.breakdown.total().is_finite());
        assert_eq!(result.decision.len(), 2);
    }

    #[test]
    fn coalesce_merges_strongly_linked_pair_and_outvotes_by_majority() {
        let mut seed = Decision::new(3);
        seed.set(0, CostSite::Pim);
        seed.set(1, CostSite::Cpu);
        seed.set(2, CostSite::Cpu);

        let mut cl = BTreeMap::new();
        cl.insert((0, 1), 1000);
        let reg = BTreeMap::new();

        let cfg = CostConfig::default();
        let decision = coalesce_by_cl_dm(&seed, &cl, &reg, &cfg);
        // 0 and 1 merge; majority (1 cpu vote vs 1 pim vote, tie goes to pim
        // since pim_votes >= non_pim_votes/2 with 1 >= 0.5).
        assert_eq!(decision.get(0), decision.get(1));
        // Block 2 was never linked, stays isolated and defaults to CPU (no
        // pim votes in its singleton group).
        assert_eq!(decision.get(2), CostSite::Cpu);
    }

    #[test]
    fn no_traffic_leaves_everyone_isolated_and_cpu() {
        let seed = Decision::new(4);
        let cl = BTreeMap::new();
        let reg = BTreeMap::new();
        let cfg = CostConfig::default();
        let decision = coalesce_by_cl_dm(&seed, &cl, &reg, &cfg);
        for id in 0..4 {
            assert_eq!(decision.get(id), CostSite::Cpu);
        }
    }
}
