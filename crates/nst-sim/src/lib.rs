//! `nst-sim`: step loop orchestrator for the rust_nst sediment router.
//!
//! # Step loop
//!
//! ```text
//! snapshot(t0)                      : if t0 is an output step
//! for step in 1..=config.total_steps:
//!   on_step_start(step)
//!   TransportEngine::step(dt)       : one atomic ledger append
//!   clock.advance(dt)
//!   on_step_end(report)
//!   on_snapshot(step)               : every config.output_interval_steps
//! on_sim_end
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Per-parcel velocities on Rayon's thread pool.          |
//! | `fx-hash`  | FxHash grouping maps in ledger queries.                |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use nst_core::RunConfig;
//! use nst_parcel::ParcelLedger;
//! use nst_sim::{NoopObserver, SimBuilder};
//!
//! let ledger = ParcelLedger::create(&network, parcels)?;
//! let mut sim = SimBuilder::new(RunConfig::default(), network, ledger)
//!     .transporter(transporter_config)
//!     .build()?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod observer;
pub mod sim;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use config::SimConfig;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use sim::Sim;
