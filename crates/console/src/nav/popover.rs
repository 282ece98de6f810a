//! Hover popover timing.
//!
//! Menu items show their description in a popover. The layout script runs
//! the Idle, OpenPending, Open, ClosePending cycle in the browser; the
//! server only supplies the delays, rendered as data attributes.

use serde::Serialize;

/// Open and close delays in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PopoverDelays {
    pub open_ms: u64,
    pub close_ms: u64,
}

impl Default for PopoverDelays {
    fn default() -> Self {
        Self {
            open_ms: 400,
            close_ms: 200,
        }
    }
}
