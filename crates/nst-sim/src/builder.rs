//! Fluent builder for constructing a [`Sim`].

use nst_core::{RunConfig, SimClock};
use nst_network::RiverNetwork;
use nst_parcel::ParcelLedger;
use nst_transport::{
    FlowDepthSource, Formula, NetworkFlowDepth, TransportEngine, TransportFormula, TransporterConfig,
};

use crate::config::validate_run;
use crate::{Sim, SimConfig, SimError, SimResult};

/// Fluent builder for [`Sim<F, S>`].
///
/// # Required inputs
///
/// - [`RunConfig`]: step length, step count, output interval
/// - [`RiverNetwork`]: the fixed topology
/// - [`ParcelLedger`]: seeded against that network
///
/// # Optional inputs (have defaults)
///
/// | Method               | Default                                   |
/// |----------------------|-------------------------------------------|
/// | `.transporter(c)`    | `TransporterConfig::default()`            |
/// | `.engine(e)`         | engine built from the transporter config  |
/// | `.forcing(s)`        | `NetworkFlowDepth` (baseline link depths) |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(run, network, ledger)
///     .transporter(transport)
///     .forcing(series)
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<F: TransportFormula = Formula, S: FlowDepthSource = NetworkFlowDepth> {
    config:  RunConfig,
    network: RiverNetwork,
    ledger:  ParcelLedger,
    engine:  TransportEngine<F>,
    forcing: S,
}

impl SimBuilder {
    pub fn new(config: RunConfig, network: RiverNetwork, ledger: ParcelLedger) -> Self {
        let transport = TransporterConfig::default();
        Self {
            config,
            network,
            ledger,
            engine: TransportEngine { formula: transport.formula, config: transport },
            forcing: NetworkFlowDepth,
        }
    }

    /// Start from a parsed run document.
    pub fn from_config(config: SimConfig, network: RiverNetwork, ledger: ParcelLedger) -> Self {
        Self::new(config.run, network, ledger).transporter(config.transport)
    }
}

impl<S: FlowDepthSource> SimBuilder<Formula, S> {
    /// Use `config` and the formula it names.
    pub fn transporter(mut self, config: TransporterConfig) -> Self {
        self.engine = TransportEngine { formula: config.formula, config };
        self
    }
}

impl<F: TransportFormula, S: FlowDepthSource> SimBuilder<F, S> {
    /// Supply a fully configured engine, e.g. with a custom formula.
    pub fn engine<G: TransportFormula>(self, engine: TransportEngine<G>) -> SimBuilder<G, S> {
        SimBuilder {
            config:  self.config,
            network: self.network,
            ledger:  self.ledger,
            engine,
            forcing: self.forcing,
        }
    }

    /// Supply per-step flow depths.
    pub fn forcing<T: FlowDepthSource>(self, forcing: T) -> SimBuilder<F, T> {
        SimBuilder {
            config:  self.config,
            network: self.network,
            ledger:  self.ledger,
            engine:  self.engine,
            forcing,
        }
    }

    /// Validate inputs and return a ready-to-run [`Sim`].  The clock resumes
    /// from the ledger's latest slice.
    pub fn build(self) -> SimResult<Sim<F, S>> {
        validate_run(&self.config)?;
        self.engine.config.validate()?;
        if self.ledger.link_count() != self.network.link_count() {
            return Err(SimError::LinkCountMismatch {
                network: self.network.link_count(),
                ledger:  self.ledger.link_count(),
            });
        }

        let clock = SimClock::at(self.ledger.last_step(), self.ledger.current_slice().time_secs);
        Ok(Sim {
            config:  self.config,
            clock,
            network: self.network,
            ledger:  self.ledger,
            engine:  self.engine,
            forcing: self.forcing,
            mass_balance_violations: 0,
        })
    }
}
