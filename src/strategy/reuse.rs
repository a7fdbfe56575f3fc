//! Reuse strategy (§4.6): search site assignments segment-by-segment,
//! from the reuse trie's least important leaf toward its most important,
//! widening each segment with switch-linked neighbors and brute-forcing
//! every CPU/PIM combination within the widened batch. Runs once per
//! seed default (a "seed sweep" over what the never-reused blocks fall
//! back to) and keeps whichever seed produced the cheapest decision,
//! then locally refines it.

use crate::cost::{evaluate, Decision};
use crate::ids::{BblId, Cost, CostConfig, CostSite};
use crate::stats::AlignedStats;
use crate::switch::SwitchCountTable;
use crate::trie::ReuseTrie;
use std::collections::BTreeMap;

const LOCAL_REFINEMENT_PASSES: usize = 2;

pub fn decide(
    aligned: &AlignedStats,
    trie: &ReuseTrie,
    switches: &SwitchCountTable,
    cfg: &CostConfig,
) -> Decision {
    let seeds = [CostSite::Cpu, CostSite::Pim, CostSite::Invalid];
    let mut best: Option<(Decision, Cost)> = None;

    for &seed in &seeds {
        let decision = run_from_seed(aligned, trie, switches, cfg, seed);
        let cost = evaluate(&decision, aligned, trie, switches, cfg).total();
        let better = match &best {
            None => true,
            Some((_, c)) => cost < *c,
        };
        if better {
            best = Some((decision, cost));
        }
    }

    best.map(|(d, _)| d).unwrap_or_else(|| Decision::new(aligned.len()))
}

/// `seed` picks the fallback site used for blocks never covered by any
/// reuse segment: `Cpu`/`Pim` forces them, anything else leaves them to
/// the per-block greedy comparison in the fill-in pass below.
fn run_from_seed(
    aligned: &AlignedStats,
    trie: &ReuseTrie,
    switches: &SwitchCountTable,
    cfg: &CostConfig,
    seed: CostSite,
) -> Decision {
    let n = aligned.len();
    let mut decision = Decision::new(n);
    // Forcing seeds pre-fill the whole vector so every block held fixed
    // during a batch's cost evaluation below already carries a concrete
    // site, not `Invalid` — otherwise reuse/switch costs at batch
    // boundaries would be computed against a background that doesn't
    // exist yet (§4.4).
    if let CostSite::Cpu | CostSite::Pim = seed {
        for id in 0..n as BblId {
            decision.set(id, seed);
        }
    }

    // "current-site-only" projection: total cost if every block ran
    // entirely on one site, used only to scale the tail cutoff below.
    let t_cpu_all: Cost = (0..n as BblId)
        .map(|id| aligned.cpu[id as usize].max_elapsed_time())
        .sum();
    let t_pim_all: Cost = (0..n as BblId)
        .map(|id| aligned.pim[id as usize].max_elapsed_time())
        .sum();
    let min_elapsed = t_cpu_all.min(t_pim_all);

    let leaves = trie.leaves_by_importance(cfg.single_segment_max_reuse_cost());
    let tail_threshold = cfg.batch_threshold * min_elapsed;
    // Leaves are sorted most-important first; find the first one whose
    // importance drops below the cutoff scale — everything from there on
    // is the "tail" this strategy actually processes.
    let tail = leaves
        .iter()
        .position(|l| l.count as f64 * cfg.single_segment_max_reuse_cost() < tail_threshold)
        .unwrap_or(leaves.len());

    // A partial trie grows as we walk the tail back toward the most
    // important leaf, so each batch is scored only against the reuse
    // segments considered so far, not the whole program's trie.
    let mut partial = ReuseTrie::new();
    for leaf in leaves[..tail].iter().rev() {
        let segment = leaf.to_segment();
        partial.insert(&segment);

        let members = segment.members();
        if members.is_empty() {
            continue;
        }
        // Too wide to exhaustively bit-enumerate; its members still ride
        // along in the partial trie for later batches' cost evaluation.
        if members.len() >= cfg.batch_size {
            continue;
        }

        let batch = widen_batch(members, switches, cfg.batch_size);
        enumerate_batch(&batch, &mut decision, aligned, &partial, switches, cfg);
    }

    // Fill in every block no reuse segment ever mentioned.
    for id in 0..n as BblId {
        if decision.get(id) != CostSite::Invalid {
            continue;
        }
        let site = match seed {
            CostSite::Cpu | CostSite::Pim => seed,
            _ => {
                let cpu_t = aligned.cpu[id as usize].max_elapsed_time();
                let pim_t = aligned.pim[id as usize].max_elapsed_time();
                if pim_t < cpu_t { CostSite::Pim } else { CostSite::Cpu }
            }
        };
        decision.set(id, site);
    }

    local_refine(&mut decision, aligned, trie, switches, cfg);
    decision
}

/// Widens a reuse segment with switch-linked neighbors up to
/// `batch_size` total members, so the bitmask search below can weigh the
/// control-flow cost of likely site transitions, not just the segment's
/// own reuse cost. Neighbors are ranked by aggregate switch count
/// (descending), ties broken by ascending `BblId`.
fn widen_batch(segment_members: &[BblId], switches: &SwitchCountTable, batch_size: usize) -> Vec<BblId> {
    let mut batch: Vec<BblId> = segment_members.to_vec();
    if batch.len() >= batch_size {
        batch.truncate(batch_size);
        return batch;
    }

    let mut candidates: BTreeMap<BblId, u64> = BTreeMap::new();
    for &m in segment_members {
        if let Some(row) = switches.row(m) {
            for (to, count) in row.iter() {
                if !batch.contains(&to) {
                    *candidates.entry(to).or_insert(0) += count;
                }
            }
        }
    }

    let mut ranked: Vec<(BblId, u64)> = candidates.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    for (id, _) in ranked {
        if batch.len() >= batch_size {
            break;
        }
        batch.push(id);
    }
    batch
}

/// Brute-forces every CPU/PIM assignment of `batch` (bit `j` set means
/// PIM), evaluating each candidate against the full trie and switch
/// table with the rest of `decision` held fixed, and commits whichever
/// assignment scores lowest. Iterates masks from all-PIM down to
/// all-CPU so that on a cost tie the later (lower-numbered) mask wins.
fn enumerate_batch(
    batch: &[BblId],
    decision: &mut Decision,
    aligned: &AlignedStats,
    trie: &ReuseTrie,
    switches: &SwitchCountTable,
    cfg: &CostConfig,
) {
    if batch.is_empty() {
        return;
    }

    let n_bits = batch.len() as u32;
    let mut best_mask: u64 = (1u64 << n_bits) - 1;
    let mut best_cost = Cost::INFINITY;

    let mut mask: i64 = (1i64 << n_bits) - 1;
    while mask >= 0 {
        let mask_bits = mask as u64;
        for (j, &id) in batch.iter().enumerate() {
            let site = if mask_bits & (1u64 << j) != 0 { CostSite::Pim } else { CostSite::Cpu };
            decision.set(id, site);
        }
        let cost = evaluate(decision, aligned, trie, switches, cfg).total();
        if cost <= best_cost {
            best_cost = cost;
            best_mask = mask_bits;
        }
        mask -= 1;
    }

    for (j, &id) in batch.iter().enumerate() {
        let site = if best_mask & (1u64 << j) != 0 { CostSite::Pim } else { CostSite::Cpu };
        decision.set(id, site);
    }
}

/// Flip-if-strictly-better local search: a fixed number of passes over
/// every block, flipping its site whenever doing so lowers total cost,
/// with all other blocks held fixed.
fn local_refine(
    decision: &mut Decision,
    aligned: &AlignedStats,
    trie: &ReuseTrie,
    switches: &SwitchCountTable,
    cfg: &CostConfig,
) {
    for _ in 0..LOCAL_REFINEMENT_PASSES {
        for id in 0..decision.len() as BblId {
            let current = decision.get(id);
            let flipped = current.other();
            decision.set(id, flipped);
            let flipped_cost = evaluate(decision, aligned, trie, switches, cfg).total();
            decision.set(id, current);
            let current_cost = evaluate(decision, aligned, trie, switches, cfg).total();
            if flipped_cost < current_cost {
                decision.set(id, flipped);
            }
        }
    }
}
