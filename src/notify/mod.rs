//! Transient notifications
//!
//! One notification is visible at a time. Showing a new one replaces the
//! current one and restarts its window. Time is passed in explicitly so the
//! TUI tick and the tests agree on what "now" is.

use std::time::Duration;

use tokio::time::Instant;

/// How long a notification stays visible
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub shown_at: Instant,
}

impl Notification {
    pub fn expires_at(&self) -> Instant {
        self.shown_at + NOTIFICATION_TTL
    }

    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at()
    }
}

#[derive(Debug, Default)]
pub struct Notifier {
    current: Option<Notification>,
    next_id: u64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `message`, replacing whatever is visible. Returns the new id.
    pub fn show(&mut self, message: impl Into<String>, severity: Severity, now: Instant) -> u64 {
        self.next_id += 1;
        let message = message.into();
        tracing::debug!("Notification [{}]: {}", severity.as_str(), message);
        self.current = Some(Notification {
            id: self.next_id,
            message,
            severity,
            shown_at: now,
        });
        self.next_id
    }

    pub fn info(&mut self, message: impl Into<String>, now: Instant) -> u64 {
        self.show(message, Severity::Info, now)
    }

    pub fn success(&mut self, message: impl Into<String>, now: Instant) -> u64 {
        self.show(message, Severity::Success, now)
    }

    pub fn error(&mut self, message: impl Into<String>, now: Instant) -> u64 {
        self.show(message, Severity::Error, now)
    }

    /// The visible notification, if its window has not elapsed.
    pub fn current(&self, now: Instant) -> Option<&Notification> {
        self.current.as_ref().filter(|n| n.is_live(now))
    }

    /// Drop the notification once its window has elapsed.
    ///
    /// Returns true when something was removed, so the caller knows to redraw.
    pub fn expire(&mut self, now: Instant) -> bool {
        match &self.current {
            Some(n) if !n.is_live(now) => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clears_at_exactly_three_seconds() {
        let t0 = Instant::now();
        let mut n = Notifier::new();
        n.success("Booked", t0);

        let almost = t0 + NOTIFICATION_TTL - Duration::from_millis(1);
        assert_eq!(n.current(almost).map(|n| n.message.as_str()), Some("Booked"));
        assert!(!n.expire(almost));

        let at = t0 + NOTIFICATION_TTL;
        assert!(n.current(at).is_none());
        assert!(n.expire(at));
        assert!(!n.expire(at));
    }

    #[test]
    fn test_replace_restarts_window() {
        let t0 = Instant::now();
        let mut n = Notifier::new();
        let first = n.info("one", t0);
        let t1 = t0 + Duration::from_secs(2);
        let second = n.error("two", t1);
        assert_ne!(first, second);

        // past the first window, inside the second
        let t2 = t0 + Duration::from_millis(4500);
        let cur = n.current(t2).unwrap();
        assert_eq!(cur.message, "two");
        assert_eq!(cur.severity, Severity::Error);
        assert!(n.current(t1 + NOTIFICATION_TTL).is_none());
    }

    #[test]
    fn test_dismiss() {
        let t0 = Instant::now();
        let mut n = Notifier::new();
        n.info("hi", t0);
        n.dismiss();
        assert!(n.current(t0).is_none());
    }
}
