//! Greedy strategy (§4.4): assign each block to whichever site ran it
//! faster in isolation, ignoring reuse and switch cost entirely. Serves
//! both as a standalone baseline and as the fallback site for `MAIN` in
//! decision-file resolution.

use crate::cost::Decision;
use crate::ids::{BblId, CostSite};
use crate::stats::AlignedStats;

pub fn decide(aligned: &AlignedStats) -> Decision {
    let mut decision = Decision::new(aligned.len());
    for id in 0..aligned.len() as BblId {
        let cpu_t = aligned.cpu[id as usize].max_elapsed_time();
        let pim_t = aligned.pim[id as usize].max_elapsed_time();
        decision.set(id, if pim_t < cpu_t { CostSite::Pim } else { CostSite::Cpu });
    }
    decision
}
