//! Tagged error kinds. Library functions return `Result<T, WspError>`;
//! `main` logs and maps these to process exit codes instead of letting a
//! panic cross the CLI boundary.

use std::fmt;

#[derive(Debug)]
pub enum WspError {
    /// Malformed `.node`/`.ele` input; fatal for the current run.
    InputParse { file: String, line: usize, message: String },
    /// An output file could not be created.
    IoOpen { file: String, source: std::io::Error },
    /// An output file could not be fully written.
    IoWrite { file: String, source: std::io::Error },
    /// `s`/`t` out of range, or `s == t` when a distinct pair was required.
    InvalidQuery { message: String },
    /// `dist[t]` is infinite.
    Unreachable { source: usize, target: usize },
    /// Approximation ratio dropped below `1.0 - tolerance`: a correctness bug,
    /// logged but non-fatal.
    StretchViolation { source: usize, target: usize, ratio: f64 },
    /// A required flag/config value is missing or invalid.
    ConfigError { message: String },
}

impl fmt::Display for WspError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WspError::InputParse { file, line, message } => {
                write!(f, "{}:{}: {}", file, line, message)
            }
            WspError::IoOpen { file, source } => write!(f, "failed to open {}: {}", file, source),
            WspError::IoWrite { file, source } => write!(f, "failed to write {}: {}", file, source),
            WspError::InvalidQuery { message } => write!(f, "invalid query: {}", message),
            WspError::Unreachable { source, target } => {
                write!(f, "no path from node {} to node {}", source, target)
            }
            WspError::StretchViolation { source, target, ratio } => write!(
                f,
                "approximation ratio {:.6} < 1.0 for ({}, {}): straight-line distance was undercut",
                ratio, source, target
            ),
            WspError::ConfigError { message } => write!(f, "configuration error: {}", message),
        }
    }
}

impl std::error::Error for WspError {}
