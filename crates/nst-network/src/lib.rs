//! `nst-network`: directed river network, topology validation, and loading.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`network`] | `RiverNetwork` (link arrays + topo order + R-tree), builder    |
//! | [`loader`]  | `load_network_csv`, `load_network_readers`                    |
//! | [`error`]   | `ConfigurationError`, `NetworkError`, `NetworkResult<T>`      |
//!
//! # Topology contract
//!
//! A built [`RiverNetwork`] is a tree draining to a single outlet:
//!
//! - every link has at most one downstream link (no distributaries),
//! - exactly one link has none (the outlet),
//! - there are no cycles.
//!
//! Anything else is rejected by [`RiverNetworkBuilder::build`] with a
//! [`ConfigurationError`].  The network is immutable afterwards.

pub mod error;
pub mod loader;
pub mod network;


pub use error::{ConfigurationError, NetworkError, NetworkResult};
pub use loader::{load_network_csv, load_network_readers};
pub use network::{LinkGeometry, RiverNetwork, RiverNetworkBuilder};
