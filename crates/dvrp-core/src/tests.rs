//! Unit tests for dvrp-core primitives.

#[cfg(test)]
mod ids {
    use crate::{EdgeId, NodeId, RequestId, VehicleId};

    #[test]
    fn index_roundtrip() {
        let id = VehicleId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(VehicleId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering_follows_registration() {
        assert!(VehicleId(0) < VehicleId(1));
        assert!(RequestId(100) > RequestId(99));
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(VehicleId::INVALID.0, u32::MAX);
        assert_eq!(NodeId::INVALID.0, u32::MAX);
        assert_eq!(EdgeId::INVALID.0, u32::MAX);
        assert_eq!(RequestId::default(), RequestId::INVALID);
    }

    #[test]
    fn display() {
        assert_eq!(VehicleId(7).to_string(), "VehicleId(7)");
        assert_eq!(RequestId(3).to_string(), "RequestId(3)");
    }
}

#[cfg(test)]
mod geo {
    use crate::GeoPoint;

    #[test]
    fn zero_distance() {
        let p = GeoPoint::new(52.52, 13.40);
        assert!(p.distance_m(p) < 0.01);
        assert_eq!(p.planar_distance_2(p), 0.0);
    }

    #[test]
    fn one_degree_latitude() {
        // ~1 degree of latitude ≈ 111 km
        let a = GeoPoint::new(52.0, 13.0);
        let b = GeoPoint::new(53.0, 13.0);
        let d = a.distance_m(b);
        assert!((d - 111_195.0).abs() < 500.0, "got {d}");
    }

    #[test]
    fn planar_distance_orders_like_haversine() {
        let c = GeoPoint::new(52.52, 13.40);
        let near = GeoPoint::new(52.53, 13.41);
        let far = GeoPoint::new(52.60, 13.50);
        assert!(c.planar_distance_2(near) < c.planar_distance_2(far));
        assert!(c.distance_m(near) < c.distance_m(far));
    }
}

#[cfg(test)]
mod time {
    use crate::{SimClock, SimConfig, SimTime};

    #[test]
    fn time_arithmetic() {
        let t = SimTime(10);
        assert_eq!(t + 5, SimTime(15));
        assert_eq!(t.offset(3), SimTime(13));
        assert_eq!(SimTime(15) - SimTime(10), 5u64);
        assert_eq!(SimTime(5).saturating_since(SimTime(10)), 0);
        assert_eq!(SimTime::MAX.offset(1), SimTime::MAX);
    }

    #[test]
    fn display_is_hms() {
        assert_eq!(SimTime(3_723).to_string(), "01:02:03");
    }

    #[test]
    fn clock_now() {
        let mut clock = SimClock::new(SimTime(100), 1);
        assert_eq!(clock.now(), SimTime(100));
        clock.advance();
        clock.advance();
        assert_eq!(clock.now(), SimTime(102));
    }

    #[test]
    fn clock_dhm() {
        let mut clock = SimClock::new(SimTime::ZERO, 3_600);
        for _ in 0..25 {
            clock.advance();
        }
        assert_eq!(clock.elapsed_dhm(), (1, 1, 0));
    }

    #[test]
    fn ticks_for_secs_rounds_up() {
        let clock = SimClock::new(SimTime::ZERO, 60);
        assert_eq!(clock.ticks_for_secs(1), 1);
        assert_eq!(clock.ticks_for_secs(120), 2);
    }

    #[test]
    fn config_end_time_and_validation() {
        let cfg = SimConfig {
            start_time:         SimTime(3_600),
            tick_duration_secs: 2,
            total_ticks:        100,
            seed:               7,
        };
        assert_eq!(cfg.end_time(), SimTime(3_800));
        assert!(cfg.validate().is_ok());

        let bad = SimConfig { tick_duration_secs: 0, ..cfg };
        assert!(bad.validate().is_err());
    }
}

#[cfg(test)]
mod rng {
    use crate::SimRng;

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = SimRng::new(12345);
        let mut r2 = SimRng::new(12345);
        for _ in 0..100 {
            let a: u64 = r1.random();
            let b: u64 = r2.random();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn children_diverge() {
        let mut root = SimRng::new(1);
        let mut c0 = root.child(0);
        let mut c1 = root.child(1);
        let a: u64 = c0.random();
        let b: u64 = c1.random();
        assert_ne!(a, b);
    }

    #[test]
    fn gen_bool_extremes() {
        let mut rng = SimRng::new(0);
        assert!(!rng.gen_bool(0.0));
        assert!(rng.gen_bool(1.0));
    }

    #[test]
    fn choose_empty_is_none() {
        let mut rng = SimRng::new(0);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
        assert_eq!(rng.choose(&[9]), Some(&9));
    }
}
