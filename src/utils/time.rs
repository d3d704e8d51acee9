use std::time::Instant;

use lazy_static::lazy_static;

lazy_static! {
    /// Process-wide anchor for monotonic timestamps
    static ref MONOTONIC_EPOCH: Instant = Instant::now();
}

/// Nanoseconds elapsed on the monotonic clock since the first call in this
/// process. Never goes backwards; saturates at `u64::MAX`.
pub fn monotonic_nanos() -> u64 {
    u64::try_from(MONOTONIC_EPOCH.elapsed().as_nanos()).unwrap_or(u64::MAX)
}
