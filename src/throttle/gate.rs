//! The admission gate.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

use super::counter::EventCounter;
use super::timer::PeriodTimer;
use super::valve::Valve;
use crate::config::ThrottleConfig;
use crate::error::{Result, ThrottleError};

/// Callback invoked with the number of events rejected in a finished period.
pub type OverflowCallback = Box<dyn Fn(u64) + Send + Sync + 'static>;

/// State shared between every handle of a gate and its period timer.
pub(crate) struct GateState {
    pub(crate) config: ThrottleConfig,
    pub(crate) counter: EventCounter,
    pub(crate) on_overflow: OverflowCallback,
    pub(crate) timer_active: AtomicBool,
    pub(crate) cycles_completed: AtomicU64,
    pub(crate) total_overflow: AtomicU64,
}

/// Point-in-time view of a gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThrottleStats {
    /// Events counted so far in the current period
    pub current_events: u64,
    /// Periods that have been drained
    pub cycles_completed: u64,
    /// Sum of all overflow reported to the callback
    pub total_overflow: u64,
    /// Whether a period timer is pending
    pub timer_active: bool,
}

/// An admission gate that admits up to `max_events_in_period` events per period.
///
/// `check` never blocks: it is one atomic increment plus, for the first
/// event of a cycle, spawning the period timer on the captured runtime.
/// Cloning the gate is cheap and every clone shares the same counter.
///
/// The period starts at the first event of a cycle, not on a fixed clock, so
/// the gate reopens no earlier than `period` after that event.
#[derive(Clone)]
pub struct Throttle {
    state: Arc<GateState>,
    handle: Handle,
}

impl Throttle {
    /// Create a gate on the current Tokio runtime.
    ///
    /// Fails if `max_events_in_period` or `period` is zero, or if no runtime
    /// is running on this thread.
    pub fn new<F>(max_events_in_period: u64, period: Duration, on_overflow: F) -> Result<Self>
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        Self::with_config(ThrottleConfig::new(max_events_in_period, period), on_overflow)
    }

    /// Create a gate from a configuration on the current Tokio runtime.
    pub fn with_config<F>(config: ThrottleConfig, on_overflow: F) -> Result<Self>
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        let handle = Handle::try_current().map_err(|_| ThrottleError::NoRuntime)?;
        Self::with_handle(config, handle, on_overflow)
    }

    /// Create a gate whose period timers run on `handle`.
    ///
    /// Use this when the gate is built on a thread outside the runtime.
    pub fn with_handle<F>(config: ThrottleConfig, handle: Handle, on_overflow: F) -> Result<Self>
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        config.validate()?;

        debug!(
            max_events_in_period = config.max_events_in_period,
            period_ms = config.period.as_millis() as u64,
            "Creating throttle gate"
        );

        Ok(Self {
            state: Arc::new(GateState {
                config,
                counter: EventCounter::new(),
                on_overflow: Box::new(on_overflow),
                timer_active: AtomicBool::new(false),
                cycles_completed: AtomicU64::new(0),
                total_overflow: AtomicU64::new(0),
            }),
            handle,
        })
    }

    /// Count one event and decide whether to admit it.
    pub fn check(&self) -> Valve {
        let count = self.state.counter.increment();
        if count == 1 {
            PeriodTimer::start(&self.handle, Arc::clone(&self.state));
        }

        Valve::from_count(count, self.state.config.max_events_in_period)
    }

    /// Turn the gate into a plain decision function.
    pub fn into_fn(self) -> impl Fn() -> Valve + Clone + Send + Sync + 'static {
        move || self.check()
    }

    /// Get the configured threshold.
    pub fn limit(&self) -> u64 {
        self.state.config.max_events_in_period
    }

    /// Get the configured period.
    pub fn period(&self) -> Duration {
        self.state.config.period
    }

    /// Get the configuration this gate was built with.
    pub fn config(&self) -> &ThrottleConfig {
        &self.state.config
    }

    /// Get the number of events counted in the current period.
    pub fn current_events(&self) -> u64 {
        self.state.counter.current()
    }

    /// Snapshot the gate's counters.
    pub fn stats(&self) -> ThrottleStats {
        ThrottleStats {
            current_events: self.state.counter.current(),
            cycles_completed: self.state.cycles_completed.load(Ordering::SeqCst),
            total_overflow: self.state.total_overflow.load(Ordering::SeqCst),
            timer_active: self.state.timer_active.load(Ordering::SeqCst),
        }
    }
}

impl fmt::Debug for Throttle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle")
            .field("config", &self.state.config)
            .field("stats", &self.stats())
            .finish()
    }
}
