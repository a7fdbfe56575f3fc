//! MPKI strategy (§4.5): a fixed-threshold memory-intensity gate. A
//! block moves to PIM only if it is memory-intensive (misses per
//! kilo-instruction above a threshold), sufficiently parallel, and
//! accounts for a large enough share of total instructions — all
//! measured from its PIM-side profile, since that is the side PIM
//! placement actually affects.
//!
//! [`decide_with_thresholds`] is also the per-grid-point predicate the
//! SCA sweep (§4.7) reuses, parameterized instead of hardcoded.

use crate::cost::Decision;
use crate::ids::{BblHash, BblId, CostConfig};
use crate::stats::AlignedStats;

pub fn decide(aligned: &AlignedStats, cfg: &CostConfig) -> Decision {
    let pim_total_instr = aligned.total_instructions_pim() as f64;
    let instr_threshold = 0.01 * pim_total_instr;
    decide_with_thresholds(
        aligned,
        cfg.mpki_threshold,
        cfg.parallelism_threshold,
        instr_threshold,
        false,
    )
}

/// Shared CPU/PIM gate: `mpki > mpki_threshold && parallelism >
/// parallelism_threshold && instr_count > instr_threshold`, skipping
/// the block entirely on `BblHash::GLOBAL`. `inclusive` switches the two
/// numeric comparisons to `>=`, which the SCA sweep needs to probe
/// threshold values of zero meaningfully.
pub(crate) fn decide_with_thresholds(
    aligned: &AlignedStats,
    mpki_threshold: f64,
    parallelism_threshold: usize,
    instr_threshold: f64,
    inclusive: bool,
) -> Decision {
    let mut decision = Decision::new(aligned.len());
    for id in 0..aligned.len() as BblId {
        let pim = &aligned.pim[id as usize];
        if pim.bblhash == BblHash::GLOBAL {
            decision.set(id, crate::ids::CostSite::Cpu);
            continue;
        }

        let mpki = if pim.instruction_count == 0 {
            0.0
        } else {
            pim.memory_access as f64 / pim.instruction_count as f64 * 1000.0
        };
        let parallelism = pim.parallelism();
        let instr = pim.instruction_count as f64;

        let mpki_gate = if inclusive { mpki >= mpki_threshold } else { mpki > mpki_threshold };
        let instr_gate = if inclusive { instr >= instr_threshold } else { instr > instr_threshold };
        let parallelism_gate = parallelism > parallelism_threshold;

        let site = if mpki_gate && parallelism_gate && instr_gate {
            crate::ids::CostSite::Pim
        } else {
            crate::ids::CostSite::Cpu
        };
        decision.set(id, site);
    }
    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::CostSite;
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
    fn memory_intensive_parallel_block_with_enough_share_goes_to_pim() {
        let h0 = BblHash::new(0, 0);
        let h1 = BblHash::new(0, 1);
        // h0: high mpki (100 misses / 1000 instr = 100 mpki), 20 threads.
        let mut cpu_rows = row(1000, 100, h0, 20);
        cpu_rows.extend(row(100, 0, h1, 1));
        let mut pim_rows = row(1000, 100, h0, 20);
        pim_rows.extend(row(100, 0, h1, 1));

        let cpu = ingest(&cpu_rows).unwrap();
        let pim = ingest(&pim_rows).unwrap();
        let aligned = align(cpu, pim);

        let decision = decide(&aligned, &CostConfig::default());
        assert_eq!(decision.get(0), CostSite::Pim);
    }

    #[test]
    fn low_parallelism_stays_on_cpu_even_if_memory_intensive() {
        let h0 = BblHash::new(0, 0);
        let cpu = ingest(&row(1000, 500, h0, 2)).unwrap();
        let pim = ingest(&row(1000, 500, h0, 2)).unwrap();
        let aligned = align(cpu, pim);

        let decision = decide(&aligned, &CostConfig::default());
        assert_eq!(decision.get(0), CostSite::Cpu);
    }

    #[test]
    fn global_hash_never_moves_to_pim() {
        let cpu = ingest(&row(1_000_000, 1_000_000, BblHash::GLOBAL, 50)).unwrap();
        let pim = ingest(&row(1_000_000, 1_000_000, BblHash::GLOBAL, 50)).unwrap();
        let aligned = align(cpu, pim);

        let decision = decide(&aligned, &CostConfig::default());
        assert_eq!(decision.get(0), CostSite::Cpu);
    }

    #[test]
    fn zero_instruction_count_yields_zero_mpki_not_div_by_zero() {
        let h0 = BblHash::new(0, 0);
        let mut rows = row(0, 0, h0, 20);
        for (_, r) in rows.iter_mut() {
            r.elapsed_time = 1.0;
        }
        let cpu = ingest(&rows).unwrap();
        let pim = ingest(&rows).unwrap();
        let aligned = align(cpu, pim);

        let decision = decide(&aligned, &CostConfig::default());
        assert_eq!(decision.get(0), CostSite::Cpu);
    }
}
