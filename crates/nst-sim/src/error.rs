use thiserror::Error;

use nst_core::DomainError;
use nst_parcel::LedgerError;
use nst_transport::TransportError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("ledger was seeded against {ledger} links but the network has {network}")]
    LinkCountMismatch { network: usize, ledger: usize },

    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;
