//! Crate-level error type.
//!
//! Mirrors the teacher crate's hand-rolled `ParseError` (a plain struct
//! implementing `Display` + `std::error::Error`) rather than pulling in
//! `anyhow`/`thiserror`: every failure mode here is fatal and diagnosed
//! once at the top level, so a lightweight enum is enough.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum SolverError {
    Io { path: String, source: io::Error },
    Parse(String),
    Invariant(String),
}

impl SolverError {
    pub fn parse(msg: impl Into<String>) -> Self {
        SolverError::Parse(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        SolverError::Invariant(msg.into())
    }

    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        SolverError::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::Io { path, source } => write!(f, "cannot read '{path}': {source}"),
            SolverError::Parse(msg) => write!(f, "parse error: {msg}"),
            SolverError::Invariant(msg) => write!(f, "invariant violation: {msg}"),
        }
    }
}

impl std::error::Error for SolverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolverError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SolverError>;
