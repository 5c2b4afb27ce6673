//! The `OutputWriter` trait implemented by all backend writers.

use crate::{LinkSummaryRow, OutputResult, ParcelSnapshotRow, StepSummaryRow};

/// Trait implemented by CSV, SQLite, and Parquet writers.
///
/// When driven by [`SimOutputObserver`][crate::SimOutputObserver], errors are
/// stored by the observer and retrieved with
/// [`take_error`][crate::SimOutputObserver::take_error].
pub trait OutputWriter {
    /// Write a batch of parcel rows from one snapshot.
    fn write_parcel_snapshots(&mut self, rows: &[ParcelSnapshotRow]) -> OutputResult<()>;

    /// Write the per-link summaries of one snapshot.
    fn write_link_summaries(&mut self, rows: &[LinkSummaryRow]) -> OutputResult<()>;

    /// Write one step summary row.
    fn write_step_summary(&mut self, row: &StepSummaryRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.  Safe to call more than
    /// once.
    fn finish(&mut self) -> OutputResult<()>;
}
