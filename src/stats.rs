//! Per-basic-block statistics: ingestion, per-thread merge, and CPU/PIM
//! alignment (§3, §4.1).

use crate::error::{Result, SolverError};
use crate::ids::{BblHash, BblId, Cost};
use std::collections::HashMap;

/// One data row as read straight off a stats-file line, before it is
/// folded into a `RunStats`.
#[derive(Clone, Copy, Debug)]
pub struct StatsRow {
    pub bblid_at_profile_time: BblId,
    pub elapsed_time: Cost,
    pub instruction_count: u64,
    pub memory_access: u64,
    pub bblhash: BblHash,
}

/// Aggregated measurements for one basic block on one site (CPU or PIM),
/// merged across however many threads touched it.
#[derive(Clone, Debug)]
pub struct RunStats {
    /// Dense id assigned during alignment (§4.1); `u32::MAX` until then.
    pub bblid: BblId,
    pub bblhash: BblHash,
    /// bblid as it appeared in the profile, before realignment.
    pub bblid_at_profile_time: BblId,
    pub instruction_count: u64,
    pub memory_access: u64,
    /// Sum of elapsed time across all threads.
    pub elapsed_time: Cost,
    /// Per-thread elapsed time, indexed by thread id.
    per_thread: Vec<Cost>,
}

pub const UNALIGNED_BBLID: BblId = BblId::MAX;

impl RunStats {
    fn new(tid: usize, row: StatsRow) -> Self {
        let mut per_thread = vec![0.0; tid + 1];
        per_thread[tid] = row.elapsed_time;
        RunStats {
            bblid: UNALIGNED_BBLID,
            bblhash: row.bblhash,
            bblid_at_profile_time: row.bblid_at_profile_time,
            instruction_count: row.instruction_count,
            memory_access: row.memory_access,
            elapsed_time: row.elapsed_time,
            per_thread,
        }
    }

    fn merge_row(&mut self, tid: usize, row: StatsRow) {
        if tid >= self.per_thread.len() {
            self.per_thread.resize(tid + 1, 0.0);
        }
        self.per_thread[tid] += row.elapsed_time;
        self.instruction_count += row.instruction_count;
        self.memory_access += row.memory_access;
        self.elapsed_time += row.elapsed_time;
    }

    /// Count of threads with positive elapsed time — a coarse
    /// degree-of-parallelism proxy.
    pub fn parallelism(&self) -> usize {
        self.per_thread.iter().filter(|&&t| t > 0.0).count()
    }

    /// Max elapsed time across threads — the wall-time contribution of
    /// this block assuming perfect overlap across threads.
    pub fn max_elapsed_time(&self) -> Cost {
        self.per_thread.iter().cloned().fold(0.0, Cost::max)
    }

    fn placeholder(bblid: BblId, bblhash: BblHash) -> Self {
        RunStats {
            bblid,
            bblhash,
            bblid_at_profile_time: UNALIGNED_BBLID,
            instruction_count: 0,
            memory_access: 0,
            elapsed_time: 0.0,
            per_thread: Vec::new(),
        }
    }
}

/// Ingest one stats file into a hash-indexed map of `RunStats`, merging
/// rows that share a `BblHash` across thread sections.
///
/// Unaligned: the resulting `bblid` field is junk (`UNALIGNED_BBLID`)
/// until [`align`] assigns dense ids.
pub fn ingest(rows: &[(usize, StatsRow)]) -> Result<HashMap<BblHash, RunStats>> {
    let mut map: HashMap<BblHash, RunStats> = HashMap::new();
    for &(tid, row) in rows {
        if row.elapsed_time < 0.0 {
            return Err(SolverError::parse(format!(
                "negative elapsed_time for bblhash {}",
                row.bblhash
            )));
        }
        map.entry(row.bblhash)
            .and_modify(|s| s.merge_row(tid, row))
            .or_insert_with(|| RunStats::new(tid, row));
    }
    Ok(map)
}

/// Aligned CPU/PIM stats: parallel vectors indexed by the same dense
/// `BblId`, satisfying `cpu[i].bblhash == pim[i].bblhash == i`'s hash,
/// and `cpu[i].bblid == pim[i].bblid == i`.
pub struct AlignedStats {
    pub cpu: Vec<RunStats>,
    pub pim: Vec<RunStats>,
}

/// Align independently-ingested CPU and PIM stats maps (§4.1).
///
/// CPU entries are sorted by `BblHash` ascending and assigned consecutive
/// ids from 0. Any CPU hash absent from the PIM map gets a zero-filled
/// placeholder so both vectors end up the same length, index-aligned.
pub fn align(
    mut cpu: HashMap<BblHash, RunStats>,
    mut pim: HashMap<BblHash, RunStats>,
) -> AlignedStats {
    let mut hashes: Vec<BblHash> = cpu.keys().copied().collect();
    hashes.sort();

    let mut cpu_out = Vec::with_capacity(hashes.len());
    let mut pim_out = Vec::with_capacity(hashes.len());

    for (bblid, hash) in hashes.into_iter().enumerate() {
        let bblid = bblid as BblId;
        let mut c = cpu.remove(&hash).expect("hash drawn from cpu map's keys");
        c.bblid = bblid;
        let mut p = pim.remove(&hash).unwrap_or_else(|| RunStats::placeholder(bblid, hash));
        p.bblid = bblid;
        cpu_out.push(c);
        pim_out.push(p);
    }

    AlignedStats {
        cpu: cpu_out,
        pim: pim_out,
    }
}

impl AlignedStats {
    pub fn len(&self) -> usize {
        self.cpu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cpu.is_empty()
    }

    /// Verifies the post-alignment invariant from §8: equal lengths and
    /// per-index hash/bblid agreement. Fatal (returns `Err`) on violation.
    pub fn check_invariant(&self) -> Result<()> {
        if self.cpu.len() != self.pim.len() {
            return Err(SolverError::invariant(format!(
                "aligned cpu/pim length mismatch: {} vs {}",
                self.cpu.len(),
                self.pim.len()
            )));
        }
        for (i, (c, p)) in self.cpu.iter().zip(self.pim.iter()).enumerate() {
            let i = i as BblId;
            if c.bblhash != p.bblhash || c.bblid != i || p.bblid != i {
                return Err(SolverError::invariant(format!(
                    "alignment mismatch at index {i}: cpu.bblid={}, pim.bblid={}, cpu.hash={}, pim.hash={}",
                    c.bblid, p.bblid, c.bblhash, p.bblhash
                )));
            }
        }
        Ok(())
    }

    pub fn total_instructions_pim(&self) -> u64 {
        self.pim.iter().map(|s| s.instruction_count).sum()
    }
}
