//! Human-readable decision report (§4.10): the per-block table, top
//! offenders by elapsed time, "Incorrect CPU/PIM Decisions" tables, and
//! the "Optimize potential" ratio.

use crate::cost::{CostBreakdown, Decision};
use crate::ids::{BblId, Cost, CostSite};
use crate::parse::HORIZONTAL_LINE;
use crate::stats::AlignedStats;
use crate::trie::ReuseTrie;
use std::fmt::Write as _;

/// Everything the reporter needs to render one run: the aligned stats,
/// the primary strategy's decision/breakdown, the always-computed SCA
/// strategy's decision/breakdown (used for the "sca" top-offenders
/// section), and the optional externally-supplied CTS/SCA decision
/// files whose resolved decisions populate the `ctsDec`/`scaDec`
/// comparison columns.
pub struct Report {
    pub aligned: AlignedStats,
    pub trie: ReuseTrie,
    pub primary_label: String,
    pub primary_decision: Decision,
    pub primary_breakdown: CostBreakdown,
    pub sca_decision: Decision,
    pub sca_breakdown: CostBreakdown,
    pub cts_decision: Option<Decision>,
    pub sca_file_decision: Option<Decision>,
}

fn site_time(aligned: &AlignedStats, id: BblId, site: CostSite) -> Cost {
    match site {
        CostSite::Cpu => aligned.cpu[id as usize].max_elapsed_time(),
        CostSite::Pim => aligned.pim[id as usize].max_elapsed_time(),
        CostSite::Follower | CostSite::Invalid => 0.0,
    }
}

/// Total reuse-segment occurrence count each `BblId` participates in,
/// summed across every leaf whose path includes it — the `bbCount`
/// column.
fn bb_counts(trie: &ReuseTrie, n: usize) -> Vec<u64> {
    let mut counts = vec![0u64; n];
    for seg in trie.export_all_segments() {
        for &id in seg.members() {
            counts[id as usize] += seg.count;
        }
    }
    counts
}

impl Report {
    pub fn render(&self) -> String {
        let mut out = String::new();
        let n = self.aligned.len();
        let counts = bb_counts(&self.trie, n);

        writeln!(out, "{HORIZONTAL_LINE}").unwrap();
        writeln!(
            out,
            "{:>7} {:>8} {:>8} {:>8} {:>12} {:>8} {:>15} {:>15} {:>15} {:>18} {:>18}",
            "BBLID", "Decision", "ctsDec", "scaDec", "Parallelism", "bbCount", "CPU", "PIM", "Difference", "Hash(hi)", "Hash(lo)"
        )
        .unwrap();

        for id in 0..n as BblId {
            let cpu_t = self.aligned.cpu[id as usize].max_elapsed_time();
            let pim_t = self.aligned.pim[id as usize].max_elapsed_time();
            let hash = self.aligned.cpu[id as usize].bblhash;
            let cts_letter = self
                .cts_decision
                .as_ref()
                .map(|d| d.get(id).as_letter())
                .unwrap_or("-");
            let sca_letter = self
                .sca_file_decision
                .as_ref()
                .map(|d| d.get(id).as_letter())
                .unwrap_or("-");
            writeln!(
                out,
                "{:>7} {:>8} {:>8} {:>8} {:>12} {:>8} {:>15.1} {:>15.1} {:>15.1} {:>18x} {:>18x}",
                id,
                self.primary_decision.get(id).as_letter(),
                cts_letter,
                sca_letter,
                self.aligned.pim[id as usize].parallelism(),
                counts[id as usize],
                cpu_t,
                pim_t,
                cpu_t - pim_t,
                hash.hi,
                hash.lo,
            )
            .unwrap();
        }

        for (label, decision, breakdown) in [
            (self.primary_label.as_str(), &self.primary_decision, &self.primary_breakdown),
            ("sca", &self.sca_decision, &self.sca_breakdown),
        ] {
            writeln!(out).unwrap();
            writeln!(out, "Top offenders by {label} elapsed time (> 0.5% of {label} total):").unwrap();
            let mut offenders: Vec<(BblId, Cost)> = (0..n as BblId)
                .map(|id| (id, site_time(&self.aligned, id, decision.get(id))))
                .filter(|&(_, t)| t > 0.005 * breakdown.total())
                .collect();
            offenders.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
            for (id, t) in &offenders {
                writeln!(out, "  bblid {id}: {t:.1} ns").unwrap();
            }
            if offenders.is_empty() {
                writeln!(out, "  (none)").unwrap();
            }
        }

        writeln!(out).unwrap();
        let (threshold, incorrect_cpu, incorrect_pim) =
            find_incorrect_decisions(&self.aligned, &self.primary_decision);
        writeln!(out, "Incorrect CPU Decisions (|cpu-pim| > {threshold:.1e}):").unwrap();
        for (id, diff) in &incorrect_cpu {
            writeln!(out, "  bblid {id}: diff {diff:.1} ns (decided CPU, PIM was cheaper)").unwrap();
        }
        if incorrect_cpu.is_empty() {
            writeln!(out, "  (none)").unwrap();
        }
        writeln!(out, "Incorrect PIM Decisions (|cpu-pim| > {threshold:.1e}):").unwrap();
        for (id, diff) in &incorrect_pim {
            writeln!(out, "  bblid {id}: diff {diff:.1} ns (decided PIM, CPU was cheaper)").unwrap();
        }
        if incorrect_pim.is_empty() {
            writeln!(out, "  (none)").unwrap();
        }

        let sum_incorrect: Cost = incorrect_cpu
            .iter()
            .chain(incorrect_pim.iter())
            .map(|(_, d)| d.abs())
            .sum();
        let denom = self.primary_breakdown.cpu_time + self.primary_breakdown.pim_time;
        let potential = if denom > 0.0 { sum_incorrect / denom } else { 0.0 };
        writeln!(out).unwrap();
        writeln!(out, "Optimize potential: {potential:.6}").unwrap();

        out
    }
}

/// Finds the smallest `10^k` threshold (shrinking by a factor of 10 from
/// `1e7`) for which at least one block disagrees with the sign of its
/// cpu/pim time difference.
fn find_incorrect_decisions(
    aligned: &AlignedStats,
    decision: &Decision,
) -> (Cost, Vec<(BblId, Cost)>, Vec<(BblId, Cost)>) {
    let mut threshold = 1e7;
    loop {
        let mut incorrect_cpu = Vec::new();
        let mut incorrect_pim = Vec::new();
        for id in 0..aligned.len() as BblId {
            let cpu_t = aligned.cpu[id as usize].max_elapsed_time();
            let pim_t = aligned.pim[id as usize].max_elapsed_time();
            let diff = cpu_t - pim_t;
            if diff.abs() <= threshold {
                continue;
            }
            match decision.get(id) {
                CostSite::Cpu if diff > 0.0 => incorrect_cpu.push((id, diff)),
                CostSite::Pim if diff < 0.0 => incorrect_pim.push((id, diff)),
                _ => {}
            }
        }
        if !incorrect_cpu.is_empty() || !incorrect_pim.is_empty() || threshold < 1e-9 {
            return (threshold, incorrect_cpu, incorrect_pim);
        }
        threshold /= 10.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{BblHash, CostConfig};
    use crate::stats::{align, ingest, StatsRow};
    use crate::switch::SwitchCountTable;

    fn make_report() -> Report {
        let h0 = BblHash::new(0, 0);
        let h1 = BblHash::new(0, 1);
        let row = |t: Cost, hash: BblHash| StatsRow {
            bblid_at_profile_time: 0,
            elapsed_time: t,
            instruction_count: 1,
            memory_access: 1,
            bblhash: hash,
        };
        let cpu = ingest(&[(0, row(100.0, h0)), (0, row(1.0, h1))]).unwrap();
        let pim = ingest(&[(0, row(1.0, h0)), (0, row(100.0, h1))]).unwrap();
        let aligned = align(cpu, pim);

        let mut decision = Decision::new(2);
        decision.set(0, CostSite::Cpu); // wrong: PIM was cheaper here
        decision.set(1, CostSite::Cpu);

        let cfg = CostConfig::default();
        let trie = ReuseTrie::new();
        let switches = SwitchCountTable::new();
        let breakdown = crate::cost::evaluate(&decision, &aligned, &trie, &switches, &cfg);

        Report {
            aligned,
            trie,
            primary_label: "reuse".to_string(),
            primary_decision: decision.clone(),
            primary_breakdown: breakdown,
            sca_decision: decision,
            sca_breakdown: breakdown,
            cts_decision: None,
            sca_file_decision: None,
        }
    }

    #[test]
    fn render_contains_header_and_all_rows() {
        let report = make_report();
        let text = report.render();
        assert!(text.contains("BBLID"));
        assert!(text.contains(HORIZONTAL_LINE));
        assert!(text.contains("Optimize potential"));
    }

    #[test]
    fn flags_the_deliberately_wrong_cpu_decision_at_a_low_enough_threshold() {
        let report = make_report();
        let text = report.render();
        assert!(text.contains("decided CPU, PIM was cheaper"));
    }

    #[test]
    fn no_disagreement_reports_none_sections() {
        let h0 = BblHash::new(0, 0);
        let row = |t: Cost, hash: BblHash| StatsRow {
            bblid_at_profile_time: 0,
            elapsed_time: t,
            instruction_count: 1,
            memory_access: 1,
            bblhash: hash,
        };
        let cpu = ingest(&[(0, row(1.0, h0))]).unwrap();
        let pim = ingest(&[(0, row(1.0, h0))]).unwrap();
        let aligned = align(cpu, pim);
        let mut decision = Decision::new(1);
        decision.set(0, CostSite::Cpu);
        let cfg = CostConfig::default();
        let trie = ReuseTrie::new();
        let switches = SwitchCountTable::new();
        let breakdown = crate::cost::evaluate(&decision, &aligned, &trie, &switches, &cfg);

        let report = Report {
            aligned,
            trie,
            primary_label: "mpki".to_string(),
            primary_decision: decision.clone(),
            primary_breakdown: breakdown,
            sca_decision: decision,
            sca_breakdown: breakdown,
            cts_decision: None,
            sca_file_decision: None,
        };
        let text = report.render();
        assert!(text.contains("(none)"));
    }
}
