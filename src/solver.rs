//! Top-level orchestration: wires parsing, alignment, the reuse
//! trie/switch table, every strategy, and optional CTS/SCA decision
//! files into one `Report` (§4, §6).

use crate::cost::{evaluate, Decision};
use crate::error::{Result, SolverError};
use crate::ids::CostConfig;
use crate::parse::{decision_file, reuse_file, stats_file};
use crate::report::Report;
use crate::stats::{align, ingest};
use crate::strategy::{greedy, mpki, reuse, sca};
use crate::switch::SwitchCountTable;
use crate::trie::ReuseTrie;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Which site-assignment strategy drives the primary decision. Mirrors
/// the `-m`/positional mode argument (§6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    Mpki,
    Reuse,
    Debug,
    /// Reserved for a parallel-region strategy that was never finished
    /// upstream; rejected at runtime rather than silently misbehaving.
    Para,
}

/// Resolved CLI inputs, independent of how they were actually parsed.
pub struct SolverInputs {
    pub mode: Mode,
    pub cpu_path: String,
    pub pim_path: String,
    pub reuse_path: Option<String>,
    pub cts_path: Option<String>,
    pub sca_path: Option<String>,
    pub cfg: CostConfig,
}

fn read_to_string(path: &str) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| SolverError::io(path, e))
}

/// Runs the full pipeline described in §4 and returns a fully-populated
/// `Report`.
pub fn run(inputs: &SolverInputs) -> Result<Report> {
    if inputs.mode == Mode::Para {
        return Err(SolverError::parse(
            "mode 'para' is reserved but has no implementation",
        ));
    }

    info!(cpu = %inputs.cpu_path, pim = %inputs.pim_path, "ingesting stats files");
    let cpu_text = read_to_string(&inputs.cpu_path)?;
    let pim_text = read_to_string(&inputs.pim_path)?;
    let cpu_rows = stats_file::parse(&cpu_text)?;
    let pim_rows = stats_file::parse(&pim_text)?;
    let cpu_map = ingest(&cpu_rows)?;
    let pim_map = ingest(&pim_rows)?;
    let aligned = align(cpu_map, pim_map);
    aligned.check_invariant()?;
    info!(blocks = aligned.len(), "aligned cpu/pim stats");

    let wants_reuse_file = matches!(inputs.mode, Mode::Reuse | Mode::Debug);
    let (trie, switches, inter_bb_cl_dm, inter_bb_reg_dm) = if wants_reuse_file {
        let path = inputs.reuse_path.as_deref().ok_or_else(|| {
            SolverError::parse("reuse/debug mode requires a reuse file".to_string())
        })?;
        debug!(reuse_file = %path, "parsing reuse/switch file");
        let text = read_to_string(path)?;
        let data = reuse_file::parse(&text)?;
        let mut trie = ReuseTrie::new();
        for seg in &data.segments {
            trie.insert(seg);
        }
        (trie, data.switches, data.inter_bb_cl_dm, data.inter_bb_reg_dm)
    } else {
        (ReuseTrie::new(), SwitchCountTable::new(), BTreeMap::new(), BTreeMap::new())
    };

    let greedy_decision = greedy::decide(&aligned);
    let greedy_breakdown = evaluate(&greedy_decision, &aligned, &trie, &switches, &inputs.cfg);
    info!(cost = greedy_breakdown.total(), "greedy decision evaluated");

    let mpki_decision = mpki::decide(&aligned, &inputs.cfg);
    let mpki_breakdown = evaluate(&mpki_decision, &aligned, &trie, &switches, &inputs.cfg);
    info!(cost = mpki_breakdown.total(), "mpki decision evaluated");

    let sweep = sca::sweep(&aligned, &trie, &switches, &inputs.cfg);
    info!(
        cost = sweep.breakdown.total(),
        mpki_threshold = sweep.params.mpki_threshold,
        parallelism_threshold = sweep.params.parallelism_threshold,
        instr_fraction = sweep.params.instr_fraction,
        "sca parameter sweep complete"
    );
    let sca_decision = sca::coalesce_by_cl_dm(
        &sweep.decision,
        &inter_bb_cl_dm,
        &inter_bb_reg_dm,
        &inputs.cfg,
    );
    let sca_breakdown = evaluate(&sca_decision, &aligned, &trie, &switches, &inputs.cfg);
    info!(cost = sca_breakdown.total(), "sca coalescing complete");

    let (primary_label, primary_decision, primary_breakdown) = match inputs.mode {
        Mode::Mpki => ("mpki".to_string(), mpki_decision, mpki_breakdown),
        Mode::Reuse | Mode::Debug => {
            let decision = reuse::decide(&aligned, &trie, &switches, &inputs.cfg);
            let breakdown = evaluate(&decision, &aligned, &trie, &switches, &inputs.cfg);
            info!(cost = breakdown.total(), "reuse decision evaluated");
            ("reuse".to_string(), decision, breakdown)
        }
        Mode::Para => unreachable!("rejected above"),
    };

    let cts_decision = if inputs.mode == Mode::Reuse {
        load_decision_file(inputs.cts_path.as_deref(), &aligned, &greedy_decision)?
    } else {
        None
    };
    // A separately-supplied SCA decision file feeds the report's
    // scaDecision column directly (§4.9/§4.10); it never substitutes for
    // the internally-computed sweep+coalesce decision used for the "sca"
    // top-offenders section above.
    let sca_file_decision = if inputs.mode == Mode::Reuse {
        load_decision_file(inputs.sca_path.as_deref(), &aligned, &greedy_decision)?
    } else {
        None
    };

    Ok(Report {
        aligned,
        trie,
        primary_label,
        primary_decision,
        primary_breakdown,
        sca_decision,
        sca_breakdown,
        cts_decision,
        sca_file_decision,
    })
}

fn load_decision_file(
    path: Option<&str>,
    aligned: &crate::stats::AlignedStats,
    greedy: &Decision,
) -> Result<Option<Decision>> {
    let Some(path) = path else { return Ok(None) };
    debug!(decision_file = %path, "parsing decision file");
    let text = read_to_string(path)?;
    let entries = decision_file::parse(&text)?;
    let decision = decision_file::resolve(&entries, aligned, greedy)?;
    Ok(Some(decision))
}

#[derive(Serialize)]
struct JsonExport<'a> {
    mode: &'a str,
    decision: &'a Decision,
    breakdown: crate::cost::CostBreakdown,
}

/// Writes the final decision and its cost breakdown to `path` as
/// serde_json (§10.4). This is a scripting-friendly companion to the
/// text report, never a second authoritative format.
pub fn write_json(report: &Report, path: &Path) -> Result<()> {
    let export = JsonExport {
        mode: &report.primary_label,
        decision: &report.primary_decision,
        breakdown: report.primary_breakdown,
    };
    let file = std::fs::File::create(path)
        .map_err(|e| SolverError::io(path.display().to_string(), e))?;
    serde_json::to_writer_pretty(file, &export)
        .map_err(|e| SolverError::parse(format!("json export failed: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    const STATS: &str = "\
============================================================
tid 0
bblid elapsed instr mem hash_hi hash_lo
0 10.0 100 5 0 1
1 5.0 50 2 0 2
";

    #[test]
    fn mpki_mode_runs_end_to_end_without_a_reuse_file() {
        let cpu = write_temp(STATS);
        let pim = write_temp(STATS);
        let inputs = SolverInputs {
            mode: Mode::Mpki,
            cpu_path: cpu.path().display().to_string(),
            pim_path: pim.path().display().to_string(),
            reuse_path: None,
            cts_path: None,
            sca_path: None,
            cfg: CostConfig::default(),
        };
        let report = run(&inputs).unwrap();
        assert_eq!(report.aligned.len(), 2);
        assert!(report.primary_decision.is_fully_resolved());
    }

    #[test]
    fn reuse_mode_without_a_reuse_path_is_an_error() {
        let cpu = write_temp(STATS);
        let pim = write_temp(STATS);
        let inputs = SolverInputs {
            mode: Mode::Reuse,
            cpu_path: cpu.path().display().to_string(),
            pim_path: pim.path().display().to_string(),
            reuse_path: None,
            cts_path: None,
            sca_path: None,
            cfg: CostConfig::default(),
        };
        assert!(run(&inputs).is_err());
    }

    #[test]
    fn para_mode_is_rejected() {
        let cpu = write_temp(STATS);
        let pim = write_temp(STATS);
        let inputs = SolverInputs {
            mode: Mode::Para,
            cpu_path: cpu.path().display().to_string(),
            pim_path: pim.path().display().to_string(),
            reuse_path: None,
            cts_path: None,
            sca_path: None,
            cfg: CostConfig::default(),
        };
        assert!(run(&inputs).is_err());
    }

    #[test]
    fn debug_mode_requires_a_reuse_file_but_ignores_decision_files() {
        const REUSE: &str = "\
============================================================
ReuseSegment
head = 0, count = 1 | 0 1
============================================================
BBLSwitchCount
from 0 : 1:1
";
        let cpu = write_temp(STATS);
        let pim = write_temp(STATS);
        let reuse_file = write_temp(REUSE);
        let inputs = SolverInputs {
            mode: Mode::Debug,
            cpu_path: cpu.path().display().to_string(),
            pim_path: pim.path().display().to_string(),
            reuse_path: Some(reuse_file.path().display().to_string()),
            cts_path: Some("/nonexistent/should-be-ignored".to_string()),
            sca_path: None,
            cfg: CostConfig::default(),
        };
        let report = run(&inputs).unwrap();
        assert!(report.cts_decision.is_none());
    }

    #[test]
    fn write_json_round_trips_through_serde_json() {
        let cpu = write_temp(STATS);
        let pim = write_temp(STATS);
        let inputs = SolverInputs {
            mode: Mode::Mpki,
            cpu_path: cpu.path().display().to_string(),
            pim_path: pim.path().display().to_string(),
            reuse_path: None,
            cts_path: None,
            sca_path: None,
            cfg: CostConfig::default(),
        };
        let report = run(&inputs).unwrap();
        let out = NamedTempFile::new().unwrap();
        write_json(&report, out.path()).unwrap();
        let text = std::fs::read_to_string(out.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["mode"], "mpki");
        assert!(value["decision"].is_array());
    }
}
