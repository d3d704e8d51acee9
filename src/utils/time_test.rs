use std::thread::sleep;
use std::time::Duration;

use crate::time::monotonic_nanos;

#[test]
fn test_monotonic_nanos_never_goes_backwards() {
    let mut last = monotonic_nanos();
    for _ in 0..1_000 {
        let now = monotonic_nanos();
        assert!(now >= last);
        last = now;
    }
}

#[test]
fn test_monotonic_nanos_advances_with_sleep() {
    let t1 = monotonic_nanos();
    sleep(Duration::from_millis(10));
    let t2 = monotonic_nanos();

    // Difference should be at least 10ms
    assert!(t2 - t1 >= 10_000_000);
}
