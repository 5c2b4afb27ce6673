//! Unit tests for nst-parcel.

#[cfg(test)]
mod helpers {
    use nst_core::{LinkId, PlanarPoint};
    use nst_network::{LinkGeometry, RiverNetwork, RiverNetworkBuilder};

    /// Straight chain `L0 → L1 → L2 (outlet)`, 100 m reaches.
    pub fn chain() -> RiverNetwork {
        let mut b = RiverNetworkBuilder::new();
        let n: Vec<_> = (0..4)
            .map(|i| b.add_node(PlanarPoint::new(0.0, -100.0 * i as f64), 10.0 - i as f64))
            .collect();
        for w in n.windows(2) {
            b.add_link(w[0], w[1], LinkGeometry::new(100.0, 0.01, 5.0, 1.0));
        }
        b.build().unwrap()
    }

    pub const L0: LinkId = LinkId(0);
    pub const L1: LinkId = LinkId(1);
    pub const L2: LinkId = LinkId(2);
}

// ── Ledger creation ───────────────────────────────────────────────────────────

#[cfg(test)]
mod create {
    use nst_core::{DomainError, LinkId, ParcelId, Timestep};

    use super::helpers::{L0, L1, chain};
    use crate::{InitialParcel, LedgerError, ParcelLedger};

    #[test]
    fn seeds_slice_zero() {
        let net = chain();
        let ledger = ParcelLedger::create(
            &net,
            vec![
                InitialParcel::new(L0, 0.2, 1.0, 0.01),
                InitialParcel::new(L1, 1.0, 2.0, 0.02).with_abrasion_rate(1e-4).inactive(),
            ],
        )
        .unwrap();

        assert_eq!(ledger.parcel_count(), 2);
        assert_eq!(ledger.last_step(), Timestep::ZERO);
        let s = ledger.current_state(ParcelId(1)).unwrap();
        assert_eq!(s.link, L1);
        assert_eq!(s.position, Some(1.0));
        assert!(!s.active);
        assert_eq!(s.distance_traveled_m, 0.0);
        assert_eq!(ledger.abrasion_rate(ParcelId(1)), 1e-4);
        assert_eq!(ledger.density(ParcelId(0)), 2650.0);
        assert_eq!(ledger.starting_link(ParcelId(0)), L0);
    }

    #[test]
    fn empty_ledger_is_valid() {
        let ledger = ParcelLedger::create(&chain(), Vec::new()).unwrap();
        assert_eq!(ledger.parcel_count(), 0);
        assert_eq!(ledger.current_slice().in_network_volume_m3(), 0.0);
    }

    #[test]
    fn invalid_values_rejected() {
        let net = chain();
        let cases = [
            InitialParcel::new(L0, 0.5, -1.0, 0.01),
            InitialParcel::new(L0, 0.5, f64::NAN, 0.01),
            InitialParcel::new(L0, 0.5, f64::INFINITY, 0.01),
            InitialParcel::new(L0, 0.5, 1.0, 0.0),
            InitialParcel::new(L0, 0.5, 1.0, 0.01).with_density(0.0),
            InitialParcel::new(L0, 0.5, 1.0, 0.01).with_abrasion_rate(-1e-3),
            InitialParcel::new(L0, 1.5, 1.0, 0.01),
            InitialParcel::new(L0, -0.1, 1.0, 0.01),
        ];
        for p in cases {
            let result = ParcelLedger::create(&net, vec![p]);
            assert!(matches!(result, Err(LedgerError::Domain(_))), "{p:?} should be rejected");
        }
    }

    #[test]
    fn negative_volume_names_parcel() {
        let net = chain();
        let result = ParcelLedger::create(
            &net,
            vec![InitialParcel::new(L0, 0.5, 1.0, 0.01), InitialParcel::new(L0, 0.5, -2.0, 0.01)],
        );
        match result {
            Err(LedgerError::Domain(DomainError::InvalidVolume { parcel, volume })) => {
                assert_eq!(parcel, ParcelId(1));
                assert_eq!(volume, -2.0);
            }
            other => panic!("expected InvalidVolume, got {:?}", other.err()),
        }
    }

    #[test]
    fn unknown_link_rejected() {
        let net = chain();
        for link in [LinkId(3), LinkId::OUT_OF_NETWORK] {
            let result = ParcelLedger::create(&net, vec![InitialParcel::new(link, 0.5, 1.0, 0.01)]);
            assert!(matches!(result, Err(LedgerError::UnknownLink { .. })));
        }
    }

    #[test]
    fn lookups_out_of_range() {
        let ledger = ParcelLedger::create(&chain(), vec![InitialParcel::new(L0, 0.5, 1.0, 0.01)]).unwrap();
        assert!(matches!(ledger.current_state(ParcelId(5)), Err(LedgerError::ParcelNotFound(_))));
        assert!(matches!(
            ledger.state_at(ParcelId(0), Timestep(3)),
            Err(LedgerError::StepNotFound(Timestep(3)))
        ));
    }
}

// ── Append ordering ───────────────────────────────────────────────────────────

#[cfg(test)]
mod append {
    use nst_core::{LinkId, ParcelId, Timestep};

    use super::helpers::{L0, L1, chain};
    use crate::{InitialParcel, LedgerError, OrderingError, ParcelLedger};

    fn ledger() -> ParcelLedger {
        ParcelLedger::create(
            &chain(),
            vec![InitialParcel::new(L0, 0.2, 1.0, 0.01), InitialParcel::new(L1, 0.9, 2.0, 0.02)],
        )
        .unwrap()
    }

    #[test]
    fn consecutive_steps_accepted() {
        let mut ledger = ledger();
        for t in 1..=3 {
            let mut slice = ledger.current_slice().carried_forward(t as f64 * 60.0);
            slice.position[0] += 0.1;
            ledger.append_timestep(Timestep(t), slice).unwrap();
        }
        assert_eq!(ledger.last_step(), Timestep(3));
        assert_eq!(ledger.step_count(), 4);
        let p0 = ledger.state_at(ParcelId(0), Timestep(2)).unwrap();
        assert!((p0.position.unwrap() - 0.4).abs() < 1e-12);
        assert_eq!(ledger.time_at(Timestep(3)).unwrap(), 180.0);
    }

    #[test]
    fn repeated_step_rejected() {
        let mut ledger = ledger();
        let slice = ledger.current_slice().carried_forward(10.0);
        let err = ledger.append_timestep(Timestep(0), slice).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Ordering(OrderingError::StepNotIncreasing { last: Timestep(0), got: Timestep(0) })
        ));
    }

    #[test]
    fn gap_rejected() {
        let mut ledger = ledger();
        let slice = ledger.current_slice().carried_forward(10.0);
        let err = ledger.append_timestep(Timestep(2), slice).unwrap_err();
        assert!(matches!(err, LedgerError::Ordering(OrderingError::StepGap { .. })));
    }

    #[test]
    fn time_going_backwards_rejected() {
        let mut ledger = ledger();
        let slice = ledger.current_slice().carried_forward(100.0);
        ledger.append_timestep(Timestep(1), slice).unwrap();
        let slice = ledger.current_slice().carried_forward(50.0);
        let err = ledger.append_timestep(Timestep(2), slice).unwrap_err();
        assert!(matches!(err, LedgerError::Ordering(OrderingError::TimeWentBackwards { .. })));
        assert_eq!(ledger.last_step(), Timestep(1));
    }

    #[test]
    fn equal_time_accepted() {
        let mut ledger = ledger();
        let slice = ledger.current_slice().carried_forward(0.0);
        ledger.append_timestep(Timestep(1), slice).unwrap();
        assert_eq!(ledger.slice(Timestep(1)).unwrap(), ledger.slice(Timestep(0)).unwrap());
    }

    #[test]
    fn failed_append_leaves_ledger_unchanged() {
        let mut ledger = ledger();
        let before = ledger.current_slice().clone();

        let mut bad = before.carried_forward(60.0);
        bad.volume_m3[1] = -1.0;
        assert!(matches!(ledger.append_timestep(Timestep(1), bad), Err(LedgerError::Domain(_))));

        let mut bad = before.carried_forward(60.0);
        bad.position[0] = 1.5;
        assert!(ledger.append_timestep(Timestep(1), bad).is_err());

        let mut bad = before.carried_forward(60.0);
        bad.link[0] = LinkId(42);
        assert!(matches!(
            ledger.append_timestep(Timestep(1), bad),
            Err(LedgerError::UnknownLink { .. })
        ));

        let mut bad = before.carried_forward(60.0);
        bad.volume_m3.pop();
        assert!(matches!(
            ledger.append_timestep(Timestep(1), bad),
            Err(LedgerError::CountMismatch { expected: 2, got: 1 })
        ));

        assert_eq!(ledger.last_step(), Timestep(0));
        assert_eq!(ledger.current_slice(), &before);
    }

    #[test]
    fn exported_parcel_has_no_position() {
        let mut ledger = ledger();
        let mut slice = ledger.current_slice().carried_forward(60.0);
        let mut s = slice.state(ParcelId(1));
        s.link = LinkId::OUT_OF_NETWORK;
        s.position = None;
        slice.set(ParcelId(1), s);
        ledger.append_timestep(Timestep(1), slice).unwrap();

        let s = ledger.current_state(ParcelId(1)).unwrap();
        assert!(s.is_out_of_network());
        assert_eq!(s.position, None);
        assert!(!s.active);
        assert_eq!(ledger.current_slice().exported_volume_m3(), 2.0);
        assert_eq!(ledger.current_slice().in_network_volume_m3(), 1.0);
    }
}

// ── Components ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod components {
    use super::helpers::{L0, chain};
    use crate::{ComponentMap, InitialParcel, ParcelLedgerBuilder};

    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub enum Lithology {
        #[default]
        Granite,
        Basalt,
    }

    #[test]
    fn registered_component_defaults_per_parcel() {
        let ledger = ParcelLedgerBuilder::new(vec![InitialParcel::new(L0, 0.5, 1.0, 0.01); 3])
            .register_component::<Lithology>()
            .build(&chain())
            .unwrap();
        assert_eq!(ledger.component::<Lithology>().unwrap(), &[Lithology::Granite; 3]);
        assert!(ledger.component::<u8>().is_none());
    }

    #[test]
    fn component_values_are_writable() {
        let mut ledger = ParcelLedgerBuilder::new(vec![InitialParcel::new(L0, 0.5, 1.0, 0.01); 2])
            .register_component::<Lithology>()
            .build(&chain())
            .unwrap();
        ledger.component_mut::<Lithology>().unwrap()[1] = Lithology::Basalt;
        assert_eq!(ledger.component::<Lithology>().unwrap()[1], Lithology::Basalt);
    }

    #[test]
    fn double_registration_keeps_data() {
        let mut map = ComponentMap::new();
        map.register::<u32>(2);
        map.get_mut::<u32>().unwrap()[0] = 9;
        map.register::<u32>(2);
        assert_eq!(map.get::<u32>().unwrap(), &[9, 0]);
        assert_eq!(map.type_count(), 1);
    }
}

// ── Queries ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod query {
    use std::collections::BTreeMap;

    use nst_core::{LinkId, ParcelId, Timestep};

    use super::components::Lithology;
    use super::helpers::{L0, L1, L2, chain};
    use crate::{
        Attribute, GroupBy, InitialParcel, ParcelLedger, ParcelLedgerBuilder, Query, Reducer,
        link_summaries,
    };

    fn ledger() -> ParcelLedger {
        ParcelLedger::create(
            &chain(),
            vec![
                InitialParcel::new(L0, 0.1, 1.0, 0.01),
                InitialParcel::new(L0, 0.6, 3.0, 0.03).inactive(),
                InitialParcel::new(L1, 0.4, 2.0, 0.02),
                InitialParcel::new(L2, 0.9, 0.5, 0.04),
            ],
        )
        .unwrap()
    }

    #[test]
    fn t0_volume_per_link_sums_to_seeded_total() {
        let ledger = ledger();
        let per_link = ledger.aggregate(&Query::new(Attribute::Volume).at_step(Timestep::ZERO)).unwrap();
        assert_eq!(per_link[&L0], 4.0);
        assert_eq!(per_link[&L1], 2.0);
        assert_eq!(per_link[&L2], 0.5);
        assert_eq!(per_link.values().sum::<f64>(), 6.5);
    }

    #[test]
    fn reducers() {
        let ledger = ledger();
        let run = |r| Query::new(Attribute::Diameter).reducer(r).run(&ledger).unwrap()[&L0];
        assert!((run(Reducer::Mean) - 0.02).abs() < 1e-12);
        assert_eq!(run(Reducer::Count), 2.0);
        assert_eq!(run(Reducer::Min), 0.01);
        assert_eq!(run(Reducer::Max), 0.03);
        // (0.01·1 + 0.03·3) / 4
        assert!((run(Reducer::VolumeWeightedMean) - 0.025).abs() < 1e-12);
    }

    #[test]
    fn filter_skips_parcels() {
        let ledger = ledger();
        let active_only = Query::new(Attribute::Volume)
            .filter(|p| p.state().active)
            .run(&ledger)
            .unwrap();
        assert_eq!(active_only[&L0], 1.0);
    }

    #[test]
    fn out_of_network_excluded_unless_requested() {
        let mut ledger = ledger();
        let mut slice = ledger.current_slice().carried_forward(60.0);
        let mut s = slice.state(ParcelId(3));
        s.link = LinkId::OUT_OF_NETWORK;
        slice.set(ParcelId(3), s);
        ledger.append_timestep(Timestep(1), slice).unwrap();

        let q = Query::new(Attribute::Volume);
        assert!(!q.run(&ledger).unwrap().contains_key(&LinkId::OUT_OF_NETWORK));
        assert!(!q.run(&ledger).unwrap().contains_key(&L2));

        let all = Query::new(Attribute::Volume).include_out_of_network(true).run(&ledger).unwrap();
        assert_eq!(all[&LinkId::OUT_OF_NETWORK], 0.5);

        // Starting link is static.
        let by_start = Query::new(Attribute::Count)
            .group_by(GroupBy::StartingLink)
            .include_out_of_network(true)
            .run(&ledger)
            .unwrap();
        assert_eq!(by_start[&L2], 1.0);

        // Position has no value outside the network.
        let pos = Query::new(Attribute::Position).include_out_of_network(true).run(&ledger).unwrap();
        assert!(!pos.contains_key(&LinkId::OUT_OF_NETWORK));
    }

    #[test]
    fn group_by_component() {
        let mut ledger = ParcelLedgerBuilder::new(vec![
            InitialParcel::new(L0, 0.1, 1.0, 0.01),
            InitialParcel::new(L1, 0.2, 2.0, 0.01),
            InitialParcel::new(L2, 0.3, 4.0, 0.01),
        ])
        .register_component::<Lithology>()
        .build(&chain())
        .unwrap();
        ledger.component_mut::<Lithology>().unwrap()[2] = Lithology::Basalt;

        let by_rock: BTreeMap<Lithology, f64> = Query::new(Attribute::Volume)
            .run_by(&ledger, |p| p.component::<Lithology>().copied().unwrap_or_default())
            .unwrap();
        assert_eq!(by_rock[&Lithology::Granite], 3.0);
        assert_eq!(by_rock[&Lithology::Basalt], 4.0);
    }

    #[test]
    fn unknown_step_is_an_error() {
        let ledger = ledger();
        assert!(Query::new(Attribute::Volume).at_step(Timestep(9)).run(&ledger).is_err());
    }

    #[test]
    fn summaries_cover_every_link() {
        let ledger = ledger();
        let s = link_summaries(&ledger, Timestep::ZERO).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s[0].parcel_count, 2);
        assert_eq!(s[0].active_count, 1);
        assert_eq!(s[0].total_volume_m3, 4.0);
        assert_eq!(s[0].active_volume_m3, 1.0);
        assert!((s[0].mean_diameter_m - 0.025).abs() < 1e-12);
        assert_eq!(s[2].link, L2);
    }
}

// ── Seeder ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod seeder {
    use super::helpers::{L0, L1, chain};
    use crate::{GrainSizeDistribution, ParcelLedger, ParcelSeeder};

    fn seeder(seed: u64) -> ParcelSeeder {
        let gsd = GrainSizeDistribution::new(vec![0.002, 0.01, 0.05], &[0.2, 0.5, 0.3]).unwrap();
        ParcelSeeder::new(gsd, 0.4, seed).unwrap().with_arrival_spread(3600.0)
    }

    #[test]
    fn volumes_sum_exactly() {
        let parcels = seeder(1).seed_link(L0, 1.0).unwrap();
        assert_eq!(parcels.len(), 3);
        let total: f64 = parcels.iter().map(|p| p.volume_m3).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!((parcels[2].volume_m3 - 0.2).abs() < 1e-12);
    }

    #[test]
    fn draws_from_distribution_and_stays_in_range() {
        let parcels = seeder(3).seed_link(L1, 40.0).unwrap();
        for p in &parcels {
            assert_eq!(p.link, L1);
            assert!([0.002, 0.01, 0.05].contains(&p.diameter_m));
            assert!((0.0..1.0).contains(&p.position));
            assert!(p.arrival_time_secs <= 0.0 && p.arrival_time_secs > -3600.0);
        }
    }

    #[test]
    fn deterministic_per_seed_and_link() {
        let a = seeder(7).seed_link(L0, 5.0).unwrap();
        let b = seeder(7).seed_link(L0, 5.0).unwrap();
        let c = seeder(8).seed_link(L0, 5.0).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn seeded_network_is_a_valid_ledger() {
        let net = chain();
        let parcels = seeder(0).seed_network(&net, 0.01).unwrap();
        // 0.01 m × 5 m × 100 m = 5 m³ per link
        let total: f64 = parcels.iter().map(|p| p.volume_m3).sum();
        assert!((total - 15.0).abs() < 1e-9);
        let ledger = ParcelLedger::create(&net, parcels).unwrap();
        assert!((ledger.current_slice().in_network_volume_m3() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn bad_distributions_rejected() {
        assert!(GrainSizeDistribution::new(vec![0.01, 0.02], &[1.0]).is_err());
        assert!(GrainSizeDistribution::new(vec![0.01], &[0.0]).is_err());
        assert!(GrainSizeDistribution::new(vec![-0.01], &[1.0]).is_err());
        assert!(GrainSizeDistribution::uniform(0.01).is_ok());
        let gsd = GrainSizeDistribution::uniform(0.01).unwrap();
        assert!(ParcelSeeder::new(gsd, 0.0, 0).is_err());
    }
}

// ── CSV loader ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use std::io::Cursor;

    use super::helpers::{L0, chain};
    use crate::{LedgerError, ParcelLedger, load_parcels_reader};

    #[test]
    fn loads_with_optional_columns() {
        let csv = "\
link_id,position,volume_m3,diameter_m,density,abrasion_rate,active,arrival_time_secs
0,0.25,1.0,0.02,2700,0.0001,false,-60
2,0.80,0.5,0.05,,,,
";
        let parcels = load_parcels_reader(Cursor::new(csv)).unwrap();
        assert_eq!(parcels.len(), 2);
        assert_eq!(parcels[0].link, L0);
        assert_eq!(parcels[0].density, 2700.0);
        assert!(!parcels[0].active);
        assert_eq!(parcels[0].arrival_time_secs, -60.0);
        assert_eq!(parcels[1].density, 2650.0);
        assert!(parcels[1].active);
        assert!(ParcelLedger::create(&chain(), parcels).is_ok());
    }

    #[test]
    fn malformed_row_is_parse_error() {
        let csv = "\
link_id,position,volume_m3,diameter_m,density,abrasion_rate,active,arrival_time_secs
0,middle,1.0,0.02,,,,
";
        assert!(matches!(load_parcels_reader(Cursor::new(csv)), Err(LedgerError::Parse(_))));
    }
}
