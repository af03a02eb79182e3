//! Notifications
//!
//! Non-blocking success and error messages. Each one disappears after a
//! short time-to-live.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;

/// How long a notification stays visible
pub const DEFAULT_TTL_MS: i64 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

struct Queue {
    items: VecDeque<Notification>,
    next_id: u64,
}

/// Queue of transient notifications
pub struct Notifier {
    queue: Mutex<Queue>,
    ttl: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::with_ttl(Duration::milliseconds(DEFAULT_TTL_MS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            queue: Mutex::new(Queue {
                items: VecDeque::new(),
                next_id: 1,
            }),
            ttl,
        }
    }

    fn push(&self, level: NotificationLevel, message: impl Into<String>) -> u64 {
        let message = message.into();
        match level {
            NotificationLevel::Success => tracing::info!(%message, "Notification"),
            NotificationLevel::Error => tracing::warn!(%message, "Notification"),
        }

        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        let id = queue.next_id;
        queue.next_id += 1;
        queue.items.push_back(Notification {
            id,
            level,
            message,
            created_at: Utc::now(),
        });
        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.push(NotificationLevel::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.push(NotificationLevel::Error, message)
    }

    /// Drop notifications older than the ttl; returns how many went
    pub fn expire(&self, now: DateTime<Utc>) -> usize {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        let ttl = self.ttl;
        let before = queue.items.len();
        queue.items.retain(|n| now - n.created_at < ttl);
        before - queue.items.len()
    }

    /// Notifications still visible at `now`, oldest first
    pub fn active(&self, now: DateTime<Utc>) -> Vec<Notification> {
        self.expire(now);
        let queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        queue.items.iter().cloned().collect()
    }

    /// Take every pending notification regardless of age
    pub fn drain(&self) -> Vec<Notification> {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        queue.items.drain(..).collect()
    }

    /// Most recent message, if any
    pub fn last(&self) -> Option<Notification> {
        let queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        queue.items.back().cloned()
    }
}
