use thiserror::Error;

use nst_core::DomainError;
use nst_parcel::LedgerError;

/// Errors produced by `nst-transport`.
///
/// A step that returns any of these has appended nothing to the ledger.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("ledger was seeded against {ledger} links but the network has {network}")]
    LinkCountMismatch { network: usize, ledger: usize },

    #[error("flow-depth series has {got} columns but the network has {expected} links")]
    ForcingShape { expected: usize, got: usize },

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TransportResult<T> = Result<T, TransportError>;
