//! `nst-core`: foundational types for the `rust_nst` network sediment router.
//!
//! This crate is a dependency of every other `nst-*` crate.  It has no
//! `nst-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `ParcelId`, `NodeId`, `LinkId`                        |
//! | [`geo`]         | `PlanarPoint` (projected x/y metres)                  |
//! | [`time`]        | `Timestep`, `SimClock`, `RunConfig`                   |
//! | [`rng`]         | `LinkRng` (per-link deterministic seeding)            |
//! | [`error`]       | `DomainError`, `DomainResult`                         |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{DomainError, DomainResult};
pub use geo::PlanarPoint;
pub use ids::{LinkId, NodeId, ParcelId};
pub use rng::LinkRng;
pub use time::{RunConfig, SimClock, Timestep};
