//! `nst-transport`: the per-timestep parcel transport update.
//!
//! # Crate layout
//!
//! | Module            | Contents                                                      |
//! |-------------------|---------------------------------------------------------------|
//! | [`config`]        | `TransporterConfig`: physical constants and model choices     |
//! | [`formula`]       | `TransportFormula` trait, `WilcockCrowe`, `MeyerPeterMuller`  |
//! | [`active_layer`]  | `ActiveLayerModel`, active/inactive partitioning              |
//! | [`forcing`]       | `FlowDepthSource`, `NetworkFlowDepth`, `FlowDepthSeries`      |
//! | [`engine`]        | `TransportEngine`, `StepReport`                               |
//! | [`error`]         | `TransportError`, `TransportResult<T>`                        |
//!
//! # Step pipeline
//!
//! ```text
//! step(dt):
//!   ① validate dt       : dt == 0 appends a carried-forward slice and stops
//!   ② flow depths       : from the FlowDepthSource; NaN rejected, < 0 clamped
//!   ③ partition         : newest arrivals fill the active layer per link
//!   ④ velocities        : TransportFormula → unit flux → virtual velocity
//!   ⑤ move              : links in topological order; scan-ahead across
//!                         links bounded by the link count
//!   ⑥ export            : parcels leaving the outlet go out of network
//!   ⑦ re-partition      : on the post-movement state
//!   ⑧ abrasion          : linear volume loss with distance, floored at 0
//!   ⑨ mass balance      : checked, warned, reported; never corrected
//!   ⑩ append            : one atomic ledger append
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | Computes per-parcel velocities on Rayon's thread pool.  |

pub mod active_layer;
pub mod config;
pub mod engine;
pub mod error;
pub mod forcing;
pub mod formula;


pub use active_layer::ActiveLayerModel;
pub use config::TransporterConfig;
pub use engine::{MassBalanceViolation, StepReport, TransportEngine};
pub use error::{TransportError, TransportResult};
pub use forcing::{FlowDepthSeries, FlowDepthSource, NetworkFlowDepth, load_flow_depth_csv, load_flow_depth_reader};
pub use formula::{BedSurface, FlowConditions, Formula, Grain, MeyerPeterMuller, TransportFormula, WilcockCrowe};
