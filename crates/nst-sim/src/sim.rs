//! The `Sim` struct and its step loop.

use tracing::info;

use nst_core::{RunConfig, SimClock, Timestep};
use nst_network::RiverNetwork;
use nst_parcel::ParcelLedger;
use nst_transport::{FlowDepthSource, Formula, NetworkFlowDepth, StepReport, TransportEngine, TransportFormula};

use crate::{SimObserver, SimResult};

/// The main simulation runner.
///
/// `Sim<F, S>` owns the network, the parcel ledger, the transport engine
/// (with formula `F`) and the flow-depth forcing `S`, and advances the ledger
/// one fixed-length step at a time.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<F: TransportFormula = Formula, S: FlowDepthSource = NetworkFlowDepth> {
    /// Step length, step count and output interval.
    pub config: RunConfig,

    /// Current step and elapsed physical time.
    pub clock: SimClock,

    /// Read-only topology.
    pub network: RiverNetwork,

    /// Full parcel history.  Observers and queries read it between steps.
    pub ledger: ParcelLedger,

    pub engine: TransportEngine<F>,

    pub forcing: S,

    /// Steps whose report carried a mass-balance violation.
    pub mass_balance_violations: usize,
}

impl<F: TransportFormula, S: FlowDepthSource> Sim<F, S> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the current step to `config.end_step()`.
    ///
    /// Calls observer hooks around every step.  Use
    /// [`NoopObserver`][crate::NoopObserver] if you don't need callbacks.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        info!(
            start = %self.clock.current_step,
            end = %self.config.end_step(),
            dt_secs = self.config.dt_secs,
            parcels = self.ledger.parcel_count(),
            links = self.network.link_count(),
            "simulation started"
        );

        let start = self.clock.current_step;
        if start == Timestep::ZERO && self.config.is_output_step(start) {
            observer.on_snapshot(start, &self.ledger, &self.network);
        }

        while self.clock.current_step < self.config.end_step() {
            self.step(observer)?;
        }

        let end = self.clock.current_step;
        observer.on_sim_end(end, &self.ledger);
        let slice = self.ledger.current_slice();
        info!(
            final_step = %end,
            elapsed_days = self.clock.elapsed_days(),
            in_network_m3 = slice.in_network_volume_m3(),
            exported_m3 = slice.exported_volume_m3(),
            mass_balance_violations = self.mass_balance_violations,
            "simulation finished"
        );
        Ok(())
    }

    /// Run exactly `n` steps from the current position (ignores `end_step`).
    ///
    /// Useful for tests and incremental stepping.
    pub fn run_steps<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step(observer)?;
        }
        Ok(())
    }

    /// Advance one step of `config.dt_secs`.
    pub fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<StepReport> {
        let dt = self.config.dt_secs;
        self.step_with_dt(dt, observer)
    }

    /// Advance one step of `dt_secs`, which may differ from the configured
    /// step length (e.g. a shortened final step, or zero).
    pub fn step_with_dt<O: SimObserver>(&mut self, dt_secs: f64, observer: &mut O) -> SimResult<StepReport> {
        let step = self.clock.current_step.next();
        observer.on_step_start(step, &self.clock);

        let report = self.engine.step(&self.network, &mut self.ledger, &self.forcing, dt_secs)?;
        self.clock.advance(dt_secs);

        if report.mass_balance.is_some() {
            self.mass_balance_violations += 1;
        }

        observer.on_step_end(&report);
        if self.config.is_output_step(step) {
            observer.on_snapshot(step, &self.ledger, &self.network);
        }
        Ok(report)
    }
}
