//! Minimal textual-IR stand-in for the compile-time annotator (§4.11).
//!
//! The real annotator lives outside this crate: it walks a compiled
//! module and injects calls to two no-op functions at each basic
//! block's entry and exit, tagging each call with a metadata node that
//! carries the block's `bblid`/`bblhash` so the solver's decision can be
//! matched back to it at instrumentation time. This module emits the
//! same shape as human-readable LLVM IR text, with no LLVM toolchain
//! dependency, so the contract between solver output and annotator
//! input stays exercised end to end.

use crate::ids::BblHash;

const HEAD_FN: &str = "PIMProfAnnotationHead";
const TAIL_FN: &str = "PIMProfAnnotationTail";
const METADATA_KEY: &str = "PIMProfAnnotationBBLID";

/// Declares the two annotation functions once, shared by every call site
/// in the module.
pub fn emit_annotation_functions() -> String {
    format!(
        "declare i64 @{HEAD_FN}(i64, i64, i64) #0\n\
         declare i64 @{TAIL_FN}(i64, i64, i64) #0\n\
         attributes #0 = {{ noinline nounwind optnone uwtable }}\n"
    )
}

/// Emits the head/tail call-site markers injected at one basic block's
/// entry/exit, each tagged with a metadata node keyed by
/// `PIMProfAnnotationBBLID` carrying this block's `bblid` and
/// `bblhash`.
pub fn emit_call_site(bblid: u32, hash: BblHash) -> String {
    let head_meta = bblid * 2;
    let tail_meta = bblid * 2 + 1;
    format!(
        "%h{bblid} = call i64 @{HEAD_FN}(i64 {hi}, i64 {lo}, i64 {bblid}), !{METADATA_KEY} !{head_meta}\n\
         %t{bblid} = call i64 @{TAIL_FN}(i64 {hi}, i64 {lo}, i64 {bblid}), !{METADATA_KEY} !{tail_meta}\n\
         !{head_meta} = !{{i32 {bblid}}}\n\
         !{tail_meta} = !{{i32 {bblid}}}\n",
        hi = hash.hi,
        lo = hash.lo,
    )
}

/// Emits a complete textual module annotating every `(bblid, bblhash)`
/// pair given, in order.
pub fn emit_module(bbls: &[(u32, BblHash)]) -> String {
    let mut out = emit_annotation_functions();
    out.push('\n');
    for &(bblid, hash) in bbls {
        out.push_str(&emit_call_site(bblid, hash));
    }
    out
}
