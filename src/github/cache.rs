use std::collections::HashMap;
use std::time::{Duration, Instant};

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct CacheEntry {
    payload: String,
    fetched_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < self.ttl
    }
}

pub(super) enum Lookup {
    Fresh(String),
    Stale,
    Missing,
}

/// Response bodies keyed by request path, plus the latest request ticket per path.
///
/// Entries are never evicted. The key space is the handful of endpoints one
/// account exposes, so growth is bounded in practice.
#[derive(Default)]
pub(super) struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
    latest_ticket: HashMap<String, u64>,
    next_ticket: u64,
}

impl ResponseCache {
    pub(super) fn lookup(&self, path: &str, now: Instant) -> Lookup {
        match self.entries.get(path) {
            Some(entry) if entry.is_fresh(now) => Lookup::Fresh(entry.payload.clone()),
            Some(_) => Lookup::Stale,
            None => Lookup::Missing,
        }
    }

    pub(super) fn stale_payload(&self, path: &str) -> Option<String> {
        self.entries.get(path).map(|entry| entry.payload.clone())
    }

    pub(super) fn store(&mut self, path: &str, payload: String, now: Instant, ttl: Duration) {
        self.entries.insert(
            path.to_owned(),
            CacheEntry {
                payload,
                fetched_at: now,
                ttl,
            },
        );
    }

    /// Issues a ticket that supersedes every earlier ticket for `path`.
    pub(super) fn issue_ticket(&mut self, path: &str) -> u64 {
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.latest_ticket.insert(path.to_owned(), self.next_ticket);
        self.next_ticket
    }

    pub(super) fn is_latest(&self, path: &str, ticket: u64) -> bool {
        self.latest_ticket.get(path) == Some(&ticket)
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }
}
