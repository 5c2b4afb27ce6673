//! Numeric-domain error type shared by the ledger and the transport engine.
//!
//! Values that would silently corrupt mass balance (a negative seeded
//! volume, a NaN flow depth) are rejected with a `DomainError`.  Values that
//! can be recovered locally (a negative flow depth, a volume driven below
//! zero by abrasion) are clamped by the caller and never reach this type.

use thiserror::Error;

use crate::{LinkId, ParcelId};

/// A value outside the physical domain of the model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("{parcel}: volume {volume} must be finite and non-negative")]
    InvalidVolume { parcel: ParcelId, volume: f64 },

    #[error("{parcel}: grain diameter {diameter} must be finite and positive")]
    InvalidDiameter { parcel: ParcelId, diameter: f64 },

    #[error("{parcel}: density {density} must be finite and positive")]
    InvalidDensity { parcel: ParcelId, density: f64 },

    #[error("{parcel}: abrasion rate {rate} must be finite and non-negative")]
    InvalidAbrasionRate { parcel: ParcelId, rate: f64 },

    #[error("{parcel}: position {position} is outside [0, 1]")]
    PositionOutOfRange { parcel: ParcelId, position: f64 },

    #[error("flow depth on {link} is not finite ({depth})")]
    NonFiniteFlowDepth { link: LinkId, depth: f64 },

    #[error("timestep duration {0} s must be finite and non-negative")]
    InvalidDuration(f64),

    #[error("parameter `{name}` = {value} is invalid: {reason}")]
    InvalidParameter {
        name:   &'static str,
        value:  f64,
        reason: &'static str,
    },
}

/// Shorthand result type for domain validation.
pub type DomainResult<T> = Result<T, DomainError>;
