//! Unit tests for nst-core primitives.

#[cfg(test)]
mod ids {
    use crate::{LinkId, NodeId, ParcelId};

    #[test]
    fn index_roundtrip() {
        let id = ParcelId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(ParcelId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn out_of_network_is_invalid_link() {
        assert!(LinkId::OUT_OF_NETWORK.is_out_of_network());
        assert!(!LinkId::OUT_OF_NETWORK.is_valid());
        assert!(!LinkId(0).is_out_of_network());
        assert_eq!(LinkId::default(), LinkId::OUT_OF_NETWORK);
    }

    #[test]
    fn display() {
        assert_eq!(LinkId(7).to_string(), "link#7");
        assert_eq!(NodeId(3).to_string(), "node#3");
        assert_eq!(LinkId::OUT_OF_NETWORK.to_string(), "link#none");
    }
}

#[cfg(test)]
mod time {
    use crate::{RunConfig, SimClock, Timestep};

    #[test]
    fn step_arithmetic() {
        assert_eq!(Timestep(3).next(), Timestep(4));
        assert_eq!(Timestep(0).prev(), None);
        assert_eq!(Timestep(5).prev(), Some(Timestep(4)));
        assert_eq!(Timestep(2) + 3, Timestep(5));
    }

    #[test]
    fn clock_advances_step_and_time_independently() {
        let mut clock = SimClock::new();
        clock.advance(86_400.0);
        clock.advance(0.0);
        assert_eq!(clock.current_step, Timestep(2));
        assert_eq!(clock.elapsed_secs, 86_400.0);
        assert!((clock.elapsed_days() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn output_interval() {
        let cfg = RunConfig { output_interval_steps: 5, ..RunConfig::default() };
        assert!(cfg.is_output_step(Timestep(0)));
        assert!(!cfg.is_output_step(Timestep(3)));
        assert!(cfg.is_output_step(Timestep(10)));

        let off = RunConfig { output_interval_steps: 0, ..RunConfig::default() };
        assert!(!off.is_output_step(Timestep(0)));
    }

    #[test]
    fn run_duration() {
        let cfg = RunConfig { dt_secs: 10.0, total_steps: 6, ..RunConfig::default() };
        assert_eq!(cfg.end_step(), Timestep(6));
        assert_eq!(cfg.total_secs(), 60.0);
    }
}

#[cfg(test)]
mod geo {
    use crate::PlanarPoint;

    #[test]
    fn euclidean_distance() {
        let a = PlanarPoint::new(0.0, 0.0);
        let b = PlanarPoint::new(3.0, 4.0);
        assert_eq!(a.distance_m(b), 5.0);
    }
}

#[cfg(test)]
mod rng {
    use crate::{LinkId, LinkRng};

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = LinkRng::new(12345, LinkId(0));
        let mut r2 = LinkRng::new(12345, LinkId(0));
        for _ in 0..100 {
            let a: f64 = r1.random();
            let b: f64 = r2.random();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn different_links_differ() {
        let mut r0 = LinkRng::new(1, LinkId(0));
        let mut r1 = LinkRng::new(1, LinkId(1));
        let a: u64 = r0.random();
        let b: u64 = r1.random();
        assert_ne!(a, b);
    }

    #[test]
    fn gen_range_in_bounds() {
        let mut rng = LinkRng::new(0, LinkId(4));
        for _ in 0..1000 {
            let v = rng.gen_range(0.0f64..1.0);
            assert!((0.0..1.0).contains(&v));
        }
    }
}

#[cfg(test)]
mod error {
    use crate::{DomainError, ParcelId};

    #[test]
    fn messages_name_the_parcel() {
        let e = DomainError::InvalidVolume { parcel: ParcelId(2), volume: -1.0 };
        assert_eq!(e.to_string(), "parcel#2: volume -1 must be finite and non-negative");
    }
}
