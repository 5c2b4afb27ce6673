//! `nst-output`: simulation output writers for the rust_nst sediment router.
//!
//! Three backends are provided behind Cargo features:
//!
//! | Feature   | Backend | Files created                                                          |
//! |-----------|---------|------------------------------------------------------------------------|
//! | *(none)*  | CSV     | `parcel_snapshots.csv`, `link_summaries.csv`, `step_summaries.csv`     |
//! | `sqlite`  | SQLite  | `output.db`                                                            |
//! | `parquet` | Parquet | `parcel_snapshots.parquet`, `link_summaries.parquet`, `step_summaries.parquet` |
//!
//! All backends implement [`OutputWriter`] and are driven by
//! [`SimOutputObserver`], which implements `nst_sim::SimObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use nst_output::{CsvWriter, SimOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = SimOutputObserver::new(writer);
//! sim.run(&mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "parquet")]
pub mod parquet;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SimOutputObserver;
pub use row::{LinkSummaryRow, ParcelSnapshotRow, StepSummaryRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;

#[cfg(feature = "parquet")]
pub use parquet::ParquetWriter;
