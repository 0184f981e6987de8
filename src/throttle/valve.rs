//! Admission decisions returned by the gate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Valve {
    /// Admit the event
    Open = 0,
    /// Admit the event; it took the last slot of the period
    Closing = 1,
    /// Reject the event
    Closed = 2,
}

impl Valve {
    /// Classify the `count`-th event of a period against the threshold.
    pub fn from_count(count: u64, max_events_in_period: u64) -> Self {
        if count < max_events_in_period {
            Valve::Open
        } else if count == max_events_in_period {
            Valve::Closing
        } else {
            Valve::Closed
        }
    }

    /// Whether the caller should let the event through.
    pub fn is_admitted(&self) -> bool {
        !self.is_rejected()
    }

    /// Whether the caller should drop the event.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Valve::Closed)
    }

    /// Lowercase name, as used in logs and serialized config.
    pub fn as_str(&self) -> &'static str {
        match self {
            Valve::Open => "open",
            Valve::Closing => "closing",
            Valve::Closed => "closed",
        }
    }
}

impl fmt::Display for Valve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
