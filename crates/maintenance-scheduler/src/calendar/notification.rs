use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub expires_at: Instant,
}

/// Holds at most one transient notification; a newer one replaces it.
#[derive(Debug, Clone)]
pub struct Notifier {
    duration: Duration,
    current: Option<Notification>,
}

impl Notifier {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            current: None,
        }
    }

    pub fn success(&mut self, message: impl Into<String>, now: Instant) {
        self.show(NotificationKind::Success, message.into(), now);
    }

    pub fn error(&mut self, message: impl Into<String>, now: Instant) {
        self.show(NotificationKind::Error, message.into(), now);
    }

    fn show(&mut self, kind: NotificationKind, message: String, now: Instant) {
        self.current = Some(Notification {
            kind,
            message,
            expires_at: now + self.duration,
        });
    }

    pub fn current(&self, now: Instant) -> Option<&Notification> {
        self.current
            .as_ref()
            .filter(|notification| now < notification.expires_at)
    }

    /// Drops an expired notification. Returns whether one was dropped.
    pub fn expire(&mut self, now: Instant) -> bool {
        let expired = self
            .current
            .as_ref()
            .is_some_and(|notification| now >= notification.expires_at);
        if expired {
            self.current = None;
        }
        expired
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.current.as_ref().map(|notification| notification.expires_at)
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(Duration::from_millis(3000))
    }
}
