//! One-shot period timer.
//!
//! A timer is started by the event that opens a cycle. It sleeps for the
//! period, drains the counter, and reports any overflow. It never reschedules
//! itself: the next cycle's timer is started by the next event that sees the
//! drained counter go from 0 to 1.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::{debug, error, trace, warn};

use super::gate::GateState;

/// The timer for a single period cycle.
///
/// If the timer is dropped before its deadline (its runtime shut down, or the
/// spawn was refused), `Drop` still drains the counter so the gate reopens.
pub(crate) struct PeriodTimer {
    state: Arc<GateState>,
    deadline: Instant,
    fired: bool,
}

impl PeriodTimer {
    /// Spawn the timer for the cycle that just opened.
    pub(crate) fn start(handle: &Handle, state: Arc<GateState>) {
        let was_active = state.timer_active.swap(true, Ordering::SeqCst);
        debug_assert!(!was_active, "a period timer was already running");

        debug!(
            period_ms = state.config.period.as_millis() as u64,
            "Starting period timer"
        );

        let deadline = Instant::now() + state.config.period;
        let timer = PeriodTimer {
            state,
            deadline,
            fired: false,
        };
        handle.spawn(timer.run());
    }

    async fn run(mut self) {
        tokio::time::sleep_until(self.deadline).await;
        self.fired = true;

        let total = end_cycle(&self.state);
        self.state.cycles_completed.fetch_add(1, Ordering::SeqCst);

        let max = self.state.config.max_events_in_period;
        trace!(total = total, max = max, "Period elapsed, counter drained");

        if total <= max {
            return;
        }

        let overflow = total - max;
        self.state.total_overflow.fetch_add(overflow, Ordering::SeqCst);
        warn!(
            rejected = overflow,
            total = total,
            max = max,
            "Events rejected during the last period"
        );

        let callback = &self.state.on_overflow;
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(overflow))) {
            error!(
                rejected = overflow,
                panic = %panic_message(payload.as_ref()),
                "Overflow callback panicked"
            );
        }
    }
}

impl Drop for PeriodTimer {
    fn drop(&mut self) {
        if self.fired {
            return;
        }

        let total = end_cycle(&self.state);
        warn!(
            discarded = total,
            "Period timer cancelled before its deadline, counter reset early"
        );
    }
}

/// Clear the active flag, then drain the counter.
///
/// The flag goes first: the next timer can only start after the drain, so it
/// never sees this one as still active.
fn end_cycle(state: &GateState) -> u64 {
    state.timer_active.store(false, Ordering::SeqCst);
    state.counter.drain()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_variants() {
        let static_str: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(static_str.as_ref()), "boom");

        let owned: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(panic_message(owned.as_ref()), "owned boom");

        let other: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(other.as_ref()), "<non-string panic payload>");
    }
}
