//! Throttle Gate - lock-free admission control
//!
//! This crate implements an admission gate that counts events per period and
//! classifies each one as `Open`, `Closing` or `Closed`. The counter is reset
//! by a one-shot timer task started by the first event of each period, which
//! also reports how many events were rejected once the period has elapsed.

pub mod config;
pub mod error;
pub mod throttle;

pub use config::ThrottleConfig;
pub use error::{Result, ThrottleError};
pub use throttle::{ShouldThrottle, Throttle, ThrottleStats, Valve};
