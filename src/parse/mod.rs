//! Text-format parsers for the four files the solver consumes (§4.1, §4.2,
//! §4.9, §6): CPU/PIM stats, the combined reuse+switch-count file, and
//! CTS/SCA decision files.

pub mod decision_file;
pub mod reuse_file;
pub mod stats_file;

use crate::error::{Result, SolverError};
use crate::ids::BblHash;

/// Sentinel line separating sections in every text format this crate reads
/// and the one separator the reporter writes back out (§4.10).
pub const HORIZONTAL_LINE: &str = "============================================================";

pub(crate) fn is_rule(line: &str) -> bool {
    line.contains(HORIZONTAL_LINE)
}

pub(crate) fn parse_u64_dec(tok: &str, what: &str) -> Result<u64> {
    tok.parse::<u64>()
        .map_err(|_| SolverError::parse(format!("expected decimal {what}, got '{tok}'")))
}

pub(crate) fn parse_u32_dec(tok: &str, what: &str) -> Result<u32> {
    tok.parse::<u32>()
        .map_err(|_| SolverError::parse(format!("expected decimal {what}, got '{tok}'")))
}

pub(crate) fn parse_f64_dec(tok: &str, what: &str) -> Result<f64> {
    tok.parse::<f64>()
        .map_err(|_| SolverError::parse(format!("expected numeric {what}, got '{tok}'")))
}

pub(crate) fn parse_hex_u64(tok: &str, what: &str) -> Result<u64> {
    let tok = tok.trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(tok, 16)
        .map_err(|_| SolverError::parse(format!("expected hex {what}, got '{tok}'")))
}

pub(crate) fn parse_bblhash(hi_tok: &str, lo_tok: &str) -> Result<BblHash> {
    Ok(BblHash::new(
        parse_hex_u64(hi_tok, "bblhash_hi")?,
        parse_hex_u64(lo_tok, "bblhash_lo")?,
    ))
}
