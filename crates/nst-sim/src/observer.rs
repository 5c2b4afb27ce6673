//! Simulation observer trait for progress reporting and data collection.

use nst_core::{SimClock, Timestep};
use nst_network::RiverNetwork;
use nst_parcel::ParcelLedger;
use nst_transport::StepReport;

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] around every step.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: exported-volume printer
///
/// ```rust,ignore
/// struct ExportLog;
///
/// impl SimObserver for ExportLog {
///     fn on_step_end(&mut self, report: &StepReport) {
///         if report.exported_parcels > 0 {
///             println!("{}: {:.2} m³ left the outlet", report.step, report.exported_volume_m3);
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called before `step` is computed.  `clock` still shows the previous step.
    fn on_step_start(&mut self, _step: Timestep, _clock: &SimClock) {}

    /// Called after the step's slice has been appended.
    fn on_step_end(&mut self, _report: &StepReport) {}

    /// Called on output steps (every `output_interval_steps`, plus the seeded
    /// slice when the run starts at step 0).
    fn on_snapshot(&mut self, _step: Timestep, _ledger: &ParcelLedger, _network: &RiverNetwork) {}

    /// Called once after the final step.
    fn on_sim_end(&mut self, _final_step: Timestep, _ledger: &ParcelLedger) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
