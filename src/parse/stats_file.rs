//! Parser for the CPU/PIM stats file (§4.1, §6).
//!
//! Sections are separated by [`super::HORIZONTAL_LINE`]; each section's
//! first line names a thread id (`tid <N>`), the second is a column
//! header that is skipped, and the rows that follow are
//! `bblid elapsed_time instr mem hash_hi(hex) hash_lo(hex)`.

use super::{is_rule, parse_bblhash, parse_f64_dec, parse_u32_dec, parse_u64_dec};
use crate::error::{Result, SolverError};
use crate::stats::StatsRow;

pub fn parse(text: &str) -> Result<Vec<(usize, StatsRow)>> {
    let mut out = Vec::new();
    let mut lines = text.lines();
    let mut tid: Option<usize> = None;

    while let Some(raw) = lines.next() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if is_rule(line) {
            let tid_line = lines
                .next()
                .ok_or_else(|| SolverError::parse("stats file truncated after section rule"))?
                .trim();
            let n = tid_line
                .strip_prefix("tid")
                .ok_or_else(|| SolverError::parse(format!("expected 'tid <N>', got '{tid_line}'")))?
                .trim();
            tid = Some(parse_u32_dec(n, "tid")? as usize);
            lines.next(); // column header, skipped
            continue;
        }

        let mut toks = line.split_whitespace();
        let mut next = |what: &'static str| {
            toks.next()
                .ok_or_else(|| SolverError::parse(format!("stats row missing {what}")))
        };
        let bblid = parse_u32_dec(next("bblid")?, "bblid")?;
        let elapsed_time = parse_f64_dec(next("elapsed_time")?, "elapsed_time")?;
        let instruction_count = parse_u64_dec(next("instruction_count")?, "instruction_count")?;
        let memory_access = parse_u64_dec(next("memory_access")?, "memory_access")?;
        let hi = next("bblhash_hi")?;
        let lo = next("bblhash_lo")?;
        let bblhash = parse_bblhash(hi, lo)?;

        let tid = tid.ok_or_else(|| {
            SolverError::parse("data row appears before any 'tid' section header")
        })?;

        out.push((
            tid,
            StatsRow {
                bblid_at_profile_time: bblid,
                elapsed_time,
                instruction_count,
                memory_access,
                bblhash,
            },
        ));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::BblHash;

    #[test]
    fn parses_two_sections_and_tracks_tid() {
        let text = "\
============================================================
tid 0
bblid elapsed instr mem hash_hi hash_lo
0 10.5 100 5 0 1
1 20.0 200 10 0 2
============================================================
tid 1
bblid elapsed instr mem hash_hi hash_lo
0 5.0 50 1 0 1
";
        let rows = parse(text).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].0, 0);
        assert_eq!(rows[0].1.bblhash, BblHash::new(0, 1));
        assert_eq!(rows[2].0, 1);
        assert_eq!(rows[2].1.elapsed_time, 5.0);
    }

    #[test]
    fn row_before_any_tid_header_is_fatal() {
        let text = "0 1.0 1 1 0 0\n";
        assert!(parse(text).is_err());
    }

    #[test]
    fn malformed_numeric_field_is_fatal() {
        let text = "\
============================================================
tid 0
header
0 notanumber 1 1 0 0
";
        assert!(parse(text).is_err());
    }
}
