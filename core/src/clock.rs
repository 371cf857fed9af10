//! Desk clock: the single source of "now" for timestamps and cache expiry.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum DeskClock {
    #[default]
    System,
    /// Pinned instant. Tests move it with `advance`.
    Fixed(DateTime<Utc>),
}

impl DeskClock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Fixed(at) => *at,
        }
    }

    /// Move a fixed clock forward. No-op on the system clock.
    pub fn advance(&mut self, by: Duration) {
        if let Self::Fixed(at) = self {
            *at += by;
        }
    }

    pub fn set(&mut self, at: DateTime<Utc>) {
        *self = Self::Fixed(at);
    }
}
