use std::collections::VecDeque;
use std::time::{Duration, Instant};

const MAX_VISIBLE: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub message: String,
    expires_at: Instant,
}

/// Short-lived notification messages
#[derive(Debug)]
pub struct Toasts {
    ttl: Duration,
    queue: VecDeque<Toast>,
}

impl Toasts {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            queue: VecDeque::new(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.push_at(message, Instant::now());
    }

    pub fn push_at(&mut self, message: impl Into<String>, now: Instant) {
        self.queue.push_back(Toast {
            message: message.into(),
            expires_at: now + self.ttl,
        });
        while self.queue.len() > MAX_VISIBLE {
            self.queue.pop_front();
        }
    }

    /// Drop expired toasts
    pub fn prune(&mut self, now: Instant) {
        self.queue.retain(|t| t.expires_at > now);
    }

    pub fn visible(&self) -> impl Iterator<Item = &Toast> {
        self.queue.iter()
    }

    pub fn latest(&self) -> Option<&str> {
        self.queue.back().map(|t| t.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
