//! Parser and resolver for CTS/SCA decision files (§4.9, §6).
//!
//! Both file kinds share one line format: `hash_hi(hex) hash_lo(hex) site
//! [cycles]`, `site ∈ {CPU, PIM, Follower}`. Resolution walks BblIds in
//! order, substituting `Follower` with whatever site the previous BblId
//! ended up with (PIM as the bootstrap predecessor, per an open question
//! in the reference design — preserved here for compatibility) and `MAIN`
//! with the Greedy decision.

use super::{parse_hex_u64, parse_u64_dec};
use crate::cost::Decision;
use crate::error::{Result, SolverError};
use crate::ids::{BblHash, BblId, CostSite};
use crate::stats::AlignedStats;
use std::collections::HashMap;

pub struct DecisionFileEntry {
    pub hash: BblHash,
    pub site: CostSite,
    pub cycles: Option<u64>,
}

pub fn parse(text: &str) -> Result<Vec<DecisionFileEntry>> {
    let mut out = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let toks: Vec<&str> = line.split_whitespace().collect();
        if toks.len() < 3 {
            return Err(SolverError::parse(format!(
                "decision row needs at least 3 fields: '{line}'"
            )));
        }
        let hash = BblHash::new(
            parse_hex_u64(toks[0], "bblhash_hi")?,
            parse_hex_u64(toks[1], "bblhash_lo")?,
        );
        let site = match toks[2] {
            "CPU" => CostSite::Cpu,
            "PIM" => CostSite::Pim,
            "Follower" => CostSite::Follower,
            other => {
                return Err(SolverError::parse(format!(
                    "unknown decision site token '{other}'"
                )))
            }
        };
        let cycles = match toks.get(3) {
            Some(tok) => Some(parse_u64_dec(tok, "cycles")?),
            None => None,
        };
        out.push(DecisionFileEntry { hash, site, cycles });
    }
    Ok(out)
}

/// Resolves a parsed decision file against the aligned BblId space,
/// following the fallback chain in §4.9: file entry → Follower (inherit
/// predecessor) → MAIN (Greedy) → default CPU.
pub fn resolve(
    entries: &[DecisionFileEntry],
    aligned: &AlignedStats,
    greedy: &Decision,
) -> Result<Decision> {
    let mut by_hash: HashMap<BblHash, CostSite> = HashMap::new();
    for e in entries {
        by_hash.insert(e.hash, e.site);
    }

    let mut decision = Decision::new(aligned.len());
    let mut predecessor = CostSite::Pim; // bootstrap default (§9 open question)

    for id in 0..aligned.len() as BblId {
        let hash = aligned.cpu[id as usize].bblhash;
        let site = if let Some(&file_site) = by_hash.get(&hash) {
            match file_site {
                CostSite::Follower => predecessor,
                concrete => concrete,
            }
        } else if hash == BblHash::MAIN {
            greedy.get(id)
        } else {
            CostSite::Cpu
        };

        if !matches!(site, CostSite::Cpu | CostSite::Pim) {
            return Err(SolverError::invariant(format!(
                "decision resolution left non-concrete site at bblid {id}"
            )));
        }
        decision.set(id, site);
        predecessor = site;
    }

    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{align, ingest, StatsRow};

    fn row(bblid: BblId, hash: BblHash) -> StatsRow {
        StatsRow {
            bblid_at_profile_time: bblid,
            elapsed_time: 1.0,
            instruction_count: 1,
            memory_access: 1,
            bblhash: hash,
        }
    }

    #[test]
    fn follower_inherits_predecessor_and_main_falls_to_greedy() {
        let h0 = BblHash::new(0, 0);
        let h1 = BblHash::new(0, 1);
        let h2 = BblHash::new(0, 2);
        let h3 = BblHash::new(0, 3);
        let cpu = ingest(&[
            (0, row(0, h0)),
            (0, row(1, h1)),
            (0, row(2, h2)),
            (0, row(3, h3)),
        ])
        .unwrap();
        let pim = ingest(&[
            (0, row(0, h0)),
            (0, row(1, h1)),
            (0, row(2, h2)),
            (0, row(3, h3)),
        ])
        .unwrap();
        let aligned = align(cpu, pim);

        let text = format!(
            "{:016x} {:016x} CPU\n{:016x} {:016x} Follower\n{:016x} {:016x} Follower\n{:016x} {:016x} PIM\n",
            h0.hi, h0.lo, h1.hi, h1.lo, h2.hi, h2.lo, h3.hi, h3.lo
        );
        let entries = parse(&text).unwrap();

        let greedy = Decision::new(aligned.len());
        let resolved = resolve(&entries, &aligned, &greedy).unwrap();
        assert_eq!(resolved.get(0), CostSite::Cpu);
        assert_eq!(resolved.get(1), CostSite::Cpu);
        assert_eq!(resolved.get(2), CostSite::Cpu);
        assert_eq!(resolved.get(3), CostSite::Pim);
    }

    #[test]
    fn main_hash_falls_back_to_greedy_decision() {
        let main_hash = BblHash::MAIN;
        let cpu = ingest(&[(0, row(0, main_hash))]).unwrap();
        let pim = ingest(&[(0, row(0, main_hash))]).unwrap();
        let aligned = align(cpu, pim);

        let mut greedy = Decision::new(aligned.len());
        greedy.set(0, CostSite::Pim);

        let resolved = resolve(&[], &aligned, &greedy).unwrap();
        assert_eq!(resolved.get(0), CostSite::Pim);
    }

    #[test]
    fn unmatched_non_main_hash_defaults_to_cpu() {
        let h0 = BblHash::new(9, 9);
        let cpu = ingest(&[(0, row(0, h0))]).unwrap();
        let pim = ingest(&[(0, row(0, h0))]).unwrap();
        let aligned = align(cpu, pim);

        let greedy = Decision::new(aligned.len());
        let resolved = resolve(&[], &aligned, &greedy).unwrap();
        assert_eq!(resolved.get(0), CostSite::Cpu);
    }

    #[test]
    fn unknown_site_token_is_fatal() {
        let text = "0 0 WEIRD\n";
        assert!(parse(text).is_err());
    }
}
