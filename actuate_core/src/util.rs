//! Period helpers for the host loop.

pub const MICROS_PER_SEC: u64 = 1_000_000;

/// Cycle period in microseconds for a loop rate in Hz.
/// `hz` is clamped to at least 1 and the result to at least 1 µs.
#[inline]
pub fn period_us(hz: u32) -> u64 {
    (MICROS_PER_SEC / u64::from(hz.max(1))).max(1)
}
