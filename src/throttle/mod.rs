//! Admission gate: counting, period timing, and the three-way decision.

mod counter;
mod gate;
mod timer;
mod valve;

pub use counter::EventCounter;
pub use gate::{OverflowCallback, Throttle, ThrottleStats};
pub use valve::Valve;

/// Anything that can classify an incoming event.
///
/// Implemented by [`Throttle`] and by any `Fn() -> Valve`, so request
/// pipelines can accept either a gate or a stand-in decision function.
pub trait ShouldThrottle: Send + Sync {
    /// Classify one event.
    fn should_throttle(&self) -> Valve;
}

impl ShouldThrottle for Throttle {
    fn should_throttle(&self) -> Valve {
        self.check()
    }
}

impl<F> ShouldThrottle for F
where
    F: Fn() -> Valve + Send + Sync,
{
    fn should_throttle(&self) -> Valve {
        self()
    }
}
