//! `nst-parcel`: the parcel ledger and its read-side query layer.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                      |
//! |-----------------|---------------------------------------------------------------|
//! | [`state`]       | `ParcelState` (one parcel, one step), `ParcelSlice` (SoA step) |
//! | [`ledger`]      | `ParcelLedger`, `ParcelLedgerBuilder`, `InitialParcel`        |
//! | [`component`]   | `ComponentMap`: typed application attributes per parcel       |
//! | [`query`]       | `Query`, `Attribute`, `Reducer`, `GroupBy`, link summaries     |
//! | [`seeder`]      | `ParcelSeeder`, `GrainSizeDistribution`                       |
//! | [`loader`]      | `load_parcels_csv`, `load_parcels_reader`                     |
//! | [`error`]       | `LedgerError`, `OrderingError`, `LedgerResult<T>`             |
//!
//! # Ledger model
//!
//! The ledger is an append-only time series.  Slice `t` holds one state per
//! parcel; slice 0 is the seeded state and each committed transport step
//! appends exactly one more.  Parcels are never removed: parcels that leave
//! the outlet sit at [`LinkId::OUT_OF_NETWORK`](nst_core::LinkId::OUT_OF_NETWORK)
//! for the rest of the run so exported volume stays queryable.
//!
//! # Feature flags
//!
//! | Flag      | Effect                                                     |
//! |-----------|------------------------------------------------------------|
//! | `fx-hash` | FxHash grouping maps in [`query`].                         |
//! | `serde`   | Derives `Serialize`/`Deserialize` on nst-core types.       |

pub mod component;
pub mod error;
pub mod ledger;
pub mod loader;
pub mod query;
pub mod seeder;
pub mod state;

#[cfg(test)]
mod tests;

pub use component::{ComponentMap, ComponentVec, TypedComponentVec};
pub use error::{LedgerError, LedgerResult, OrderingError};
pub use ledger::{DEFAULT_DENSITY, InitialParcel, ParcelLedger, ParcelLedgerBuilder};
pub use loader::{load_parcels_csv, load_parcels_reader};
pub use query::{
    Attribute, GroupBy, LinkSummary, ParcelView, Query, Reducer, exported_volume, in_network_volume,
    link_summaries,
};
pub use seeder::{GrainSizeDistribution, ParcelSeeder};
pub use state::{ParcelSlice, ParcelState};
