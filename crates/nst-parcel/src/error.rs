//! Error types for the parcel ledger.

use thiserror::Error;

use nst_core::{DomainError, LinkId, ParcelId, Timestep};

/// A ledger append that would break the time axis.  Never silently
/// reordered: the append is rejected and the ledger is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderingError {
    #[error("step {got} does not follow the current step {last}")]
    StepNotIncreasing { last: Timestep, got: Timestep },

    #[error("step {got} skips ahead of the current step {last}")]
    StepGap { last: Timestep, got: Timestep },

    #[error("time {got_secs} s precedes the current time {last_secs} s")]
    TimeWentBackwards { last_secs: f64, got_secs: f64 },
}

/// Errors produced by `nst-parcel`.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ordering error: {0}")]
    Ordering(#[from] OrderingError),

    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("{parcel} is placed on {link}, which is not in the network")]
    UnknownLink { parcel: ParcelId, link: LinkId },

    #[error("slice has {got} parcels but the ledger holds {expected}")]
    CountMismatch { expected: usize, got: usize },

    #[error("{0} not found in ledger")]
    ParcelNotFound(ParcelId),

    #[error("{0} not recorded in ledger")]
    StepNotFound(Timestep),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
