//! Pipeline error taxonomy.
//!
//! Classification follows the run's fate, not the failing syscall:
//! configuration and critical query errors abort before any transfer is
//! planned; construction errors are defensive re-checks of upstream
//! guarantees; submission errors carry the leg they belong to so the
//! caller can distinguish a fatal principal failure from a reportable
//! fee-leg failure.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("credential file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("invalid credential in {}: {reason}", .path.display())]
    InvalidCredential { path: PathBuf, reason: String },

    #[error("ledger query `{method}` failed: {reason}")]
    LedgerQuery { method: &'static str, reason: String },

    #[error("invalid transfer: {0}")]
    InvalidTransfer(String),

    #[error("{leg} leg submission failed: {reason}")]
    Submission { leg: &'static str, reason: String },

    #[error("audit log append failed: {0}")]
    Audit(#[from] std::io::Error),
}
