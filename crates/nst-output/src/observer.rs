//! `SimOutputObserver<W>`: bridges `SimObserver` to an `OutputWriter`.

use nst_core::Timestep;
use nst_network::RiverNetwork;
use nst_parcel::{ParcelLedger, link_summaries};
use nst_sim::SimObserver;
use nst_transport::StepReport;

use crate::row::{LinkSummaryRow, ParcelSnapshotRow, StepSummaryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes step summaries after every step and parcel
/// snapshots plus link summaries on output steps, to any [`OutputWriter`]
/// backend.
///
/// Errors from the writer are stored internally because `SimObserver` methods
/// have no return value.  After `sim.run()` returns, check for errors with
/// [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer:        W,
    write_parcels: bool,
    last_error:    Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, write_parcels: true, last_error: None }
    }

    /// Skip per-parcel rows and keep only link and step summaries.  Useful
    /// for large parcel counts.
    pub fn summaries_only(mut self) -> Self {
        self.write_parcels = false;
        self
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the sim).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn snapshot(&mut self, step: Timestep, ledger: &ParcelLedger) -> OutputResult<()> {
        if self.write_parcels {
            let rows = ParcelSnapshotRow::from_slice(step, ledger.slice(step)?);
            if !rows.is_empty() {
                self.writer.write_parcel_snapshots(&rows)?;
            }
        }
        let links: Vec<LinkSummaryRow> = link_summaries(ledger, step)?
            .iter()
            .map(|s| LinkSummaryRow::new(step, s))
            .collect();
        self.writer.write_link_summaries(&links)
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_step_end(&mut self, report: &StepReport) {
        let result = self.writer.write_step_summary(&StepSummaryRow::from(report));
        self.store_err(result);
    }

    fn on_snapshot(&mut self, step: Timestep, ledger: &ParcelLedger, _network: &RiverNetwork) {
        let result = self.snapshot(step, ledger);
        self.store_err(result);
    }

    fn on_sim_end(&mut self, _final_step: Timestep, _ledger: &ParcelLedger) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
