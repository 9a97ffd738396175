use super::*;

#[test]
fn same_seed_same_stream() {
    let mut a = Rng64::for_frame(42, 3);
    let mut b = Rng64::for_frame(42, 3);
    for _ in 0..16 {
        assert_eq!(a.next_u64(), b.next_u64());
    }
}

#[test]
fn frames_get_distinct_streams() {
    let mut a = Rng64::for_frame(42, 0);
    let mut b = Rng64::for_frame(42, 1);
    assert_ne!(a.next_u64(), b.next_u64());
}

#[test]
fn range_stays_inclusive() {
    let mut rng = Rng64::new(7);
    for _ in 0..1000 {
        let v = rng.range_i64(-3, 3);
        assert!((-3..=3).contains(&v));
    }
    assert_eq!(rng.range_i64(5, 5), 5);
}

#[test]
fn unit_samples_are_in_range() {
    let mut rng = Rng64::new(1);
    for _ in 0..1000 {
        let v = rng.next_f64_01();
        assert!((0.0..1.0).contains(&v));
        assert!(rng.next_poisson(4.0) >= 0.0);
    }
}
