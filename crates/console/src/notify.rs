//! Flash notifications.
//!
//! Handlers queue notifications in the session; the next rendered page takes
//! them out and shows each one once. Text is translated when queued.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::warn;

/// Session key for the pending notification queue.
const SESSION_NOTIFICATIONS: &str = "notifications";

/// Auto-dismiss delay of validation and error notifications.
pub const DEFAULT_AUTO_DISMISS_MS: u64 = 5000;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

/// One notification as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: Level,
    pub title: String,
    /// Body lines, one per rendered row.
    pub lines: Vec<String>,
    /// Dismiss automatically after this many milliseconds.
    pub auto_dismiss_ms: Option<u64>,
}

impl Notification {
    pub fn new(level: Level, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            lines: Vec::new(),
            auto_dismiss_ms: Some(DEFAULT_AUTO_DISMISS_MS),
        }
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(Level::Success, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(Level::Info, title)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(Level::Error, title)
    }

    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn with_lines(mut self, lines: impl IntoIterator<Item = String>) -> Self {
        self.lines.extend(lines);
        self
    }

    /// Keep the notification until the user closes it.
    pub fn sticky(mut self) -> Self {
        self.auto_dismiss_ms = None;
        self
    }
}

/// Append a notification to the session queue.
///
/// Failures are logged and swallowed: a lost notification must never turn
/// into a failed request.
pub async fn push(session: &Session, notification: Notification) {
    let mut queue: Vec<Notification> = session
        .get(SESSION_NOTIFICATIONS)
        .await
        .unwrap_or(None)
        .unwrap_or_default();
    queue.push(notification);

    if let Err(e) = session.insert(SESSION_NOTIFICATIONS, queue).await {
        warn!(error = %e, "failed to queue notification");
    }
}

/// Remove and return every pending notification.
pub async fn take(session: &Session) -> Vec<Notification> {
    match session.remove::<Vec<Notification>>(SESSION_NOTIFICATIONS).await {
        Ok(queue) => queue.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "failed to read notifications");
            Vec::new()
        }
    }
}
