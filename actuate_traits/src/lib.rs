pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Boxed error used at the hardware seams so that implementations can surface
/// their own error types without the engine knowing about them.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Supplies one pre-fetched input snapshot per control cycle.
///
/// Returning `Ok(None)` means the source is exhausted and the host loop should stop.
pub trait InputSource<I> {
    fn next_input(&mut self, cycle: u64) -> Result<Option<I>, BoxError>;
}

/// Physical bus transport for the frames produced by the engine.
pub trait Transport<F> {
    fn send(&mut self, frames: &[F]) -> Result<(), BoxError>;
}

/// Persisted tuning store polled on a fixed cadence.
pub trait TuningSource<T> {
    /// Return the latest tuning, or `None` when nothing changed.
    fn poll(&mut self) -> Result<Option<T>, BoxError>;
}
