//! Idle logout timer.
//!
//! The timer lives in the authenticated session as its last-activity
//! timestamp. Every page request and every activity heartbeat posted by the
//! layout script resets it; the first request at or after the deadline
//! expires it, once.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kinds of user activity that keep the session alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Pointer,
    Key,
    Scroll,
    Touch,
    /// A page request reached the server.
    Navigation,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::Pointer => "pointer",
            ActivityKind::Key => "key",
            ActivityKind::Scroll => "scroll",
            ActivityKind::Touch => "touch",
            ActivityKind::Navigation => "navigation",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = UnknownActivity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pointer" | "mousemove" | "mousedown" | "click" => Ok(ActivityKind::Pointer),
            "key" | "keydown" | "keypress" => Ok(ActivityKind::Key),
            "scroll" | "wheel" => Ok(ActivityKind::Scroll),
            "touch" | "touchstart" => Ok(ActivityKind::Touch),
            "navigation" => Ok(ActivityKind::Navigation),
            other => Err(UnknownActivity(other.to_string())),
        }
    }
}

/// Error for activity names the heartbeat endpoint does not know.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown activity kind {0:?}")]
pub struct UnknownActivity(pub String);

/// Result of polling the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleState {
    /// The deadline has not passed.
    Active,
    /// The deadline passed; reported once.
    Expired,
    /// Already reported as expired.
    Fired,
}

/// Inactivity timer of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdleTimer {
    timeout: Duration,
    last_activity: DateTime<Utc>,
    fired: bool,
}

impl IdleTimer {
    /// Start a timer at `now`.
    pub fn start(timeout: Duration, now: DateTime<Utc>) -> Self {
        Self::resume(timeout, now)
    }

    /// Rebuild a timer from its persisted last-activity timestamp.
    pub fn resume(timeout: Duration, last_activity: DateTime<Utc>) -> Self {
        Self {
            timeout,
            last_activity,
            fired: false,
        }
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.last_activity + self.timeout
    }

    /// Restart the countdown from `now`.
    ///
    /// Ignored once the timer has fired, and never moves the clock back.
    pub fn record_activity(&mut self, _kind: ActivityKind, now: DateTime<Utc>) {
        if self.fired {
            return;
        }
        if now > self.last_activity {
            self.last_activity = now;
        }
    }

    /// Check the timer at `now`.
    pub fn poll(&mut self, now: DateTime<Utc>) -> IdleState {
        if self.fired {
            return IdleState::Fired;
        }
        if now >= self.deadline() {
            self.fired = true;
            return IdleState::Expired;
        }
        IdleState::Active
    }

    /// Milliseconds left before the deadline, zero once passed.
    pub fn remaining_ms(&self, now: DateTime<Utc>) -> i64 {
        (self.deadline() - now).num_milliseconds().max(0)
    }
}
