//! Unit tests for nst-sim.

#[cfg(test)]
mod helpers {
    use nst_core::{LinkId, PlanarPoint, RunConfig, SimClock, Timestep};
    use nst_network::{LinkGeometry, RiverNetwork, RiverNetworkBuilder};
    use nst_parcel::{InitialParcel, ParcelLedger};
    use nst_transport::{
        ActiveLayerModel, BedSurface, FlowConditions, Grain, StepReport, TransportEngine, TransportFormula,
        TransporterConfig,
    };

    use crate::SimObserver;

    /// Constant unit flux.  With zero porosity and a 1 m active layer the
    /// parcel velocity in m/s equals the flux.
    pub struct FixedFlux(pub f64);

    impl TransportFormula for FixedFlux {
        fn unit_flux(&self, _: &FlowConditions, _: &BedSurface, _: Grain) -> f64 {
            self.0
        }
    }

    pub fn engine(v: f64) -> TransportEngine<FixedFlux> {
        let config = TransporterConfig {
            porosity: 0.0,
            active_layer: ActiveLayerModel::Constant { thickness_m: 1.0 },
            ..TransporterConfig::default()
        };
        TransportEngine::with_formula(config, FixedFlux(v)).unwrap()
    }

    pub fn run_config(dt_secs: f64, total_steps: u64, output_interval_steps: u64) -> RunConfig {
        RunConfig { dt_secs, total_steps, seed: 7, output_interval_steps }
    }

    /// Chain of `n` links, 100 m long, 5 m wide, 1 m deep.
    pub fn chain(n: usize) -> RiverNetwork {
        let mut b = RiverNetworkBuilder::new();
        let mut up = b.add_node(PlanarPoint::new(0.0, 0.0), 100.0);
        for i in 0..n {
            let down = b.add_node(PlanarPoint::new(0.0, -100.0 * (i + 1) as f64), 99.0 - i as f64);
            b.add_link(up, down, LinkGeometry::new(100.0, 0.01, 5.0, 1.0));
            up = down;
        }
        b.build().unwrap()
    }

    pub fn one_parcel(net: &RiverNetwork) -> ParcelLedger {
        ParcelLedger::create(net, vec![InitialParcel::new(LinkId(0), 0.0, 1.0, 0.02)]).unwrap()
    }

    /// Records every hook invocation.
    #[derive(Default)]
    pub struct Recorder {
        pub starts:    Vec<(Timestep, Timestep)>,
        pub reports:   Vec<StepReport>,
        pub snapshots: Vec<(Timestep, usize)>,
        pub ended_at:  Option<Timestep>,
    }

    impl SimObserver for Recorder {
        fn on_step_start(&mut self, step: Timestep, clock: &SimClock) {
            self.starts.push((step, clock.current_step));
        }

        fn on_step_end(&mut self, report: &StepReport) {
            self.reports.push(*report);
        }

        fn on_snapshot(&mut self, step: Timestep, ledger: &ParcelLedger, _network: &RiverNetwork) {
            self.snapshots.push((step, ledger.step_count()));
        }

        fn on_sim_end(&mut self, final_step: Timestep, _ledger: &ParcelLedger) {
            self.ended_at = Some(final_step);
        }
    }
}

// ── SimBuilder validation ─────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use nst_core::{RunConfig, Timestep};
    use nst_transport::{ActiveLayerModel, Formula, TransporterConfig};

    use super::helpers::{chain, engine, one_parcel, run_config};
    use crate::{NoopObserver, SimBuilder, SimConfig, SimError};

    #[test]
    fn builds_successfully_with_defaults() {
        let net = chain(2);
        let ledger = one_parcel(&net);
        let sim = SimBuilder::new(RunConfig::default(), net, ledger).build().unwrap();
        assert_eq!(sim.clock.current_step, Timestep::ZERO);
        assert_eq!(sim.clock.elapsed_secs, 0.0);
        assert_eq!(sim.engine.config, TransporterConfig::default());
        assert_eq!(sim.mass_balance_violations, 0);
    }

    #[test]
    fn transporter_sets_formula_from_config() {
        let net = chain(1);
        let ledger = one_parcel(&net);
        let transport = TransporterConfig {
            formula: Formula::MeyerPeterMuller(Default::default()),
            active_layer: ActiveLayerModel::WongParker,
            ..TransporterConfig::default()
        };
        let sim = SimBuilder::new(RunConfig::default(), net, ledger)
            .transporter(transport)
            .build()
            .unwrap();
        assert_eq!(sim.engine.formula, transport.formula);
        assert_eq!(sim.engine.config.active_layer, ActiveLayerModel::WongParker);
    }

    #[test]
    fn from_config_uses_both_sections() {
        let net = chain(1);
        let ledger = one_parcel(&net);
        let config = SimConfig::from_json_str(
            r#"{ "run": { "dt_secs": 60, "total_steps": 3 }, "transport": { "porosity": 0.4 } }"#,
        )
        .unwrap();
        let sim = SimBuilder::from_config(config, net, ledger).build().unwrap();
        assert_eq!(sim.config.dt_secs, 60.0);
        assert_eq!(sim.config.total_steps, 3);
        assert_eq!(sim.engine.config.porosity, 0.4);
    }

    #[test]
    fn link_count_mismatch_errors() {
        let ledger = one_parcel(&chain(2));
        let result = SimBuilder::new(RunConfig::default(), chain(1), ledger).build();
        assert!(matches!(result, Err(SimError::LinkCountMismatch { network: 1, ledger: 2 })));
    }

    #[test]
    fn negative_dt_errors() {
        let net = chain(1);
        let ledger = one_parcel(&net);
        let result = SimBuilder::new(run_config(-1.0, 3, 1), net, ledger).build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn invalid_transporter_errors() {
        let net = chain(1);
        let ledger = one_parcel(&net);
        let bad = TransporterConfig { porosity: 1.0, ..TransporterConfig::default() };
        let result = SimBuilder::new(RunConfig::default(), net, ledger).transporter(bad).build();
        assert!(matches!(result, Err(SimError::Domain(_))));
    }

    #[test]
    fn clock_resumes_from_ledger() {
        let net = chain(1);
        let mut first = SimBuilder::new(run_config(30.0, 4, 0), net, one_parcel(&chain(1)))
            .engine(engine(0.5))
            .build()
            .unwrap();
        first.run_steps(2, &mut NoopObserver).unwrap();

        let resumed = SimBuilder::new(run_config(30.0, 4, 0), first.network, first.ledger)
            .build()
            .unwrap();
        assert_eq!(resumed.clock.current_step, Timestep(2));
        assert_eq!(resumed.clock.elapsed_secs, 60.0);
    }
}

// ── Run loop ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod run_tests {
    use nst_core::{LinkId, ParcelId, Timestep};
    use nst_transport::FlowDepthSeries;

    use super::helpers::{Recorder, chain, engine, one_parcel, run_config};
    use crate::{NoopObserver, SimBuilder};

    #[test]
    fn run_reaches_end_step() {
        let net = chain(2);
        let ledger = one_parcel(&net);
        let mut sim = SimBuilder::new(run_config(10.0, 5, 1), net, ledger)
            .engine(engine(1.0))
            .build()
            .unwrap();
        sim.run(&mut NoopObserver).unwrap();

        assert_eq!(sim.clock.current_step, Timestep(5));
        assert_eq!(sim.clock.elapsed_secs, 50.0);
        assert_eq!(sim.ledger.last_step(), Timestep(5));
        assert_eq!(sim.ledger.step_count(), 6);
        assert_eq!(sim.ledger.current_slice().time_secs, 50.0);
    }

    #[test]
    fn parcel_moves_then_exports() {
        let net = chain(1);
        let ledger = one_parcel(&net);
        let mut sim = SimBuilder::new(run_config(60.0, 2, 1), net, ledger)
            .engine(engine(1.0))
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        let mid = sim.ledger.state_at(ParcelId(0), Timestep(1)).unwrap();
        assert_eq!(mid.link, LinkId(0));
        assert!((mid.position.unwrap() - 0.6).abs() < 1e-12);

        let end = sim.ledger.current_state(ParcelId(0)).unwrap();
        assert!(end.is_out_of_network());
        assert_eq!(rec.reports[0].exported_parcels, 0);
        assert_eq!(rec.reports[1].exported_parcels, 1);
        assert_eq!(rec.reports[1].exported_volume_m3, 1.0);
        assert_eq!(sim.mass_balance_violations, 0);
    }

    #[test]
    fn run_steps_ignores_end_step() {
        let net = chain(1);
        let ledger = one_parcel(&net);
        let mut sim = SimBuilder::new(run_config(1.0, 2, 0), net, ledger)
            .engine(engine(0.1))
            .build()
            .unwrap();
        sim.run_steps(4, &mut NoopObserver).unwrap();
        assert_eq!(sim.clock.current_step, Timestep(4));
        assert_eq!(sim.ledger.last_step(), Timestep(4));
    }

    #[test]
    fn run_after_end_step_is_a_no_op() {
        let net = chain(1);
        let ledger = one_parcel(&net);
        let mut sim = SimBuilder::new(run_config(1.0, 2, 0), net, ledger)
            .engine(engine(0.1))
            .build()
            .unwrap();
        sim.run_steps(3, &mut NoopObserver).unwrap();

        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();
        assert!(rec.reports.is_empty());
        assert_eq!(rec.ended_at, Some(Timestep(3)));
    }

    #[test]
    fn zero_dt_step_repeats_slice() {
        let net = chain(1);
        let ledger = one_parcel(&net);
        let mut sim = SimBuilder::new(run_config(10.0, 5, 0), net, ledger)
            .engine(engine(1.0))
            .build()
            .unwrap();
        sim.step(&mut NoopObserver).unwrap();
        let report = sim.step_with_dt(0.0, &mut NoopObserver).unwrap();

        assert_eq!(report.step, Timestep(2));
        assert_eq!(report.moved_parcels, 0);
        assert_eq!(sim.clock.elapsed_secs, 10.0);
        let a = sim.ledger.slice(Timestep(1)).unwrap();
        let b = sim.ledger.slice(Timestep(2)).unwrap();
        assert_eq!(a.position, b.position);
        assert_eq!(a.time_secs, b.time_secs);
    }

    #[test]
    fn forcing_series_drives_depths() {
        let net = chain(1);
        let ledger = one_parcel(&net);
        // No flow for the first step, baseline flow afterwards.
        let series = FlowDepthSeries::new(vec![vec![0.0], vec![1.0]], &net).unwrap();
        let mut sim = SimBuilder::new(run_config(10.0, 2, 0), net, ledger)
            .engine(engine(1.0))
            .forcing(series)
            .build()
            .unwrap();
        sim.run(&mut NoopObserver).unwrap();

        let first = sim.ledger.state_at(ParcelId(0), Timestep(1)).unwrap();
        let second = sim.ledger.state_at(ParcelId(0), Timestep(2)).unwrap();
        assert_eq!(first.position, Some(0.0));
        assert!((second.position.unwrap() - 0.1).abs() < 1e-12);
    }
}

// ── Observer hooks ────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use nst_core::Timestep;

    use super::helpers::{Recorder, chain, engine, one_parcel, run_config};
    use crate::SimBuilder;

    #[test]
    fn hook_counts_and_order() {
        let net = chain(2);
        let ledger = one_parcel(&net);
        let mut sim = SimBuilder::new(run_config(5.0, 5, 2), net, ledger)
            .engine(engine(1.0))
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        assert_eq!(rec.starts.len(), 5);
        // The clock still shows the previous step when a step starts.
        assert_eq!(rec.starts[0], (Timestep(1), Timestep(0)));
        assert_eq!(rec.starts[4], (Timestep(5), Timestep(4)));
        assert_eq!(rec.reports.len(), 5);
        assert_eq!(rec.reports[2].step, Timestep(3));
        // Seeded slice plus every second step, each seen after its append.
        assert_eq!(rec.snapshots, vec![(Timestep(0), 1), (Timestep(2), 3), (Timestep(4), 5)]);
        assert_eq!(rec.ended_at, Some(Timestep(5)));
    }

    #[test]
    fn zero_interval_disables_snapshots() {
        let net = chain(1);
        let ledger = one_parcel(&net);
        let mut sim = SimBuilder::new(run_config(5.0, 3, 0), net, ledger)
            .engine(engine(1.0))
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();
        assert!(rec.snapshots.is_empty());
        assert_eq!(rec.reports.len(), 3);
    }
}

// ── Config documents ──────────────────────────────────────────────────────────

#[cfg(test)]
mod config_tests {
    use nst_core::RunConfig;
    use nst_transport::{ActiveLayerModel, TransporterConfig};

    use crate::{SimConfig, SimError};

    #[test]
    fn empty_document_takes_defaults() {
        let config = SimConfig::from_json_str("{}").unwrap();
        assert_eq!(config.run, RunConfig::default());
        assert_eq!(config.transport, TransporterConfig::default());
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let config = SimConfig::from_json_str(
            r#"{
                "run": { "total_steps": 10, "output_interval_steps": 5 },
                "transport": { "active_layer": { "kind": "constant", "thickness_m": 0.2 } }
            }"#,
        )
        .unwrap();
        assert_eq!(config.run.total_steps, 10);
        assert_eq!(config.run.output_interval_steps, 5);
        assert_eq!(config.run.dt_secs, RunConfig::default().dt_secs);
        assert_eq!(config.transport.active_layer, ActiveLayerModel::Constant { thickness_m: 0.2 });
    }

    #[test]
    fn invalid_values_rejected() {
        let bad_dt = SimConfig::from_json_str(r#"{ "run": { "dt_secs": -5 } }"#);
        assert!(matches!(bad_dt, Err(SimError::Config(_))));

        let bad_porosity = SimConfig::from_json_str(r#"{ "transport": { "porosity": 1.5 } }"#);
        assert!(matches!(bad_porosity, Err(SimError::Domain(_))));

        let malformed = SimConfig::from_json_str("{ run: ");
        assert!(matches!(malformed, Err(SimError::Json(_))));
    }

    #[test]
    fn json_round_trip() {
        let config = SimConfig::from_json_str(r#"{ "run": { "seed": 99 } }"#).unwrap();
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(SimConfig::from_json_str(&text).unwrap(), config);
    }
}
