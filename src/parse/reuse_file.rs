//! Parser for the combined reuse-segment + switch-count file (§4.2, §6).
//!
//! Two horizontal-rule-separated sections, each labeled on the line after
//! the rule: `ReuseSegment` and `BBLSwitchCount`. Row formats are loose —
//! tokens are whitespace-separated and the meaningful ones are picked out
//! by shape rather than fixed column position, matching how the
//! reference profiler emits them.

use super::{is_rule, parse_u32_dec, parse_u64_dec};
use crate::error::{Result, SolverError};
use crate::ids::BblId;
use crate::switch::SwitchCountTable;
use crate::trie::ReuseSegment;
use std::collections::BTreeMap;

#[derive(Default)]
pub struct ReuseFileData {
    pub segments: Vec<ReuseSegment>,
    pub switches: SwitchCountTable,
    /// `(min, max)` BblId pair → accumulated count; cache-line traffic
    /// proxy summed over adjacent members of each reuse segment (§3).
    pub inter_bb_cl_dm: BTreeMap<(BblId, BblId), u64>,
    /// `(min, max)` BblId pair → accumulated count; register/transfer
    /// traffic proxy summed over each switch-table `(from, to)` pair (§3).
    pub inter_bb_reg_dm: BTreeMap<(BblId, BblId), u64>,
}

fn unordered(a: BblId, b: BblId) -> (BblId, BblId) {
    if a <= b { (a, b) } else { (b, a) }
}

fn parse_reuse_row(line: &str, out: &mut ReuseFileData) -> Result<()> {
    let toks: Vec<&str> = line.split_whitespace().collect();

    let head_tok = toks
        .iter()
        .find(|t| t.ends_with(','))
        .ok_or_else(|| SolverError::parse(format!("reuse row missing 'head,' token: '{line}'")))?;
    let head = parse_u32_dec(head_tok.trim_end_matches(','), "head")?;

    let count_idx = toks
        .iter()
        .position(|&t| t == "count")
        .ok_or_else(|| SolverError::parse(format!("reuse row missing 'count': '{line}'")))?;
    let count_tok = toks[count_idx + 1..]
        .iter()
        .find(|t| **t != "=")
        .ok_or_else(|| SolverError::parse(format!("reuse row missing count value: '{line}'")))?;
    let count = parse_u64_dec(count_tok, "count")?;

    let pipe_idx = toks
        .iter()
        .position(|&t| t == "|")
        .ok_or_else(|| SolverError::parse(format!("reuse row missing '|': '{line}'")))?;

    let mut seg = ReuseSegment::new(head, count);
    for tok in &toks[pipe_idx + 1..] {
        seg.insert(parse_u32_dec(tok, "bblid")?);
    }

    let members = seg.members();
    for pair in members.windows(2) {
        let (a, b) = unordered(pair[0], pair[1]);
        *out.inter_bb_cl_dm.entry((a, b)).or_insert(0) += count;
    }

    out.segments.push(seg);
    Ok(())
}

fn parse_switch_row(line: &str, out: &mut ReuseFileData) -> Result<()> {
    let toks: Vec<&str> = line.split_whitespace().collect();
    if toks.len() < 2 || toks[0] != "from" {
        return Err(SolverError::parse(format!(
            "switch row must start with 'from <bblid>': '{line}'"
        )));
    }
    let from = parse_u32_dec(toks[1], "from")?;

    for tok in toks.iter().skip(2) {
        if *tok == ":" {
            continue;
        }
        let (to_tok, count_tok) = tok
            .split_once(':')
            .ok_or_else(|| SolverError::parse(format!("switch entry must be '<to>:<count>': '{tok}'")))?;
        let to = parse_u32_dec(to_tok, "to")?;
        let count = parse_u64_dec(count_tok, "count")?;
        out.switches.add(from, to, count);
        let (a, b) = unordered(from, to);
        *out.inter_bb_reg_dm.entry((a, b)).or_insert(0) += count;
    }
    Ok(())
}

pub fn parse(text: &str) -> Result<ReuseFileData> {
    let mut out = ReuseFileData::default();
    let mut lines = text.lines();
    let mut section: Option<&str> = None;

    while let Some(raw) = lines.next() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if is_rule(line) {
            let label = lines
                .next()
                .ok_or_else(|| SolverError::parse("reuse file truncated after section rule"))?
                .trim();
            section = Some(match label {
                "ReuseSegment" => "ReuseSegment",
                "BBLSwitchCount" => "BBLSwitchCount",
                other => {
                    return Err(SolverError::parse(format!(
                        "unknown reuse-file section label '{other}'"
                    )))
                }
            });
            continue;
        }

        match section {
            Some("ReuseSegment") => parse_reuse_row(line, &mut out)?,
            Some("BBLSwitchCount") => parse_switch_row(line, &mut out)?,
            _ => {
                return Err(SolverError::parse(
                    "reuse file data row appears before any section label",
                ))
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reuse_and_switch_sections() {
        let text = "\
============================================================
ReuseSegment
head = 3, count = 10 | 3 4 5
============================================================
BBLSwitchCount
from 3 : 4:10 5:20
";
        let data = parse(text).unwrap();
        assert_eq!(data.segments.len(), 1);
        assert_eq!(data.segments[0].head, 3);
        assert_eq!(data.segments[0].count, 10);
        assert_eq!(data.segments[0].members(), &[3, 4, 5]);

        assert_eq!(data.inter_bb_cl_dm[&(3, 4)], 10);
        assert_eq!(data.inter_bb_cl_dm[&(4, 5)], 10);

        let row3 = data.switches.row(3).unwrap();
        let tos: Vec<(BblId, u64)> = row3.iter().collect();
        assert_eq!(tos, vec![(4, 10), (5, 20)]);

        assert_eq!(data.inter_bb_reg_dm[&(3, 4)], 10);
        assert_eq!(data.inter_bb_reg_dm[&(3, 5)], 20);
    }

    #[test]
    fn malformed_switch_entry_is_fatal() {
        let text = "\
============================================================
BBLSwitchCount
from 3 : garbage
";
        assert!(parse(text).is_err());
    }
}
