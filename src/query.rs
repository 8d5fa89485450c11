//! Request sequencing
//!
//! Responses can arrive out of order. Each request gets a ticket from a
//! global counter, and only the newest ticket issued for a key is accepted.

use std::collections::HashMap;

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    pub key: String,
    pub seq: u64,
}

#[derive(Debug, Default)]
pub struct RequestSequencer {
    counter: u64,
    latest: HashMap<String, u64>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, key: impl Into<String>) -> RequestTicket {
        self.counter += 1;
        let key = key.into();
        self.latest.insert(key.clone(), self.counter);
        RequestTicket {
            key,
            seq: self.counter,
        }
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.latest.get(&ticket.key) == Some(&ticket.seq)
    }

    /// Like `is_current`, logging the tickets it drops
    pub fn accept(&self, ticket: &RequestTicket) -> bool {
        let current = self.is_current(ticket);
        if !current {
            debug!(
                "Dropping stale response for {} (seq {}, latest {:?})",
                ticket.key,
                ticket.seq,
                self.latest.get(&ticket.key)
            );
        }
        current
    }

    /// Any in-flight ticket for the key becomes stale
    pub fn invalidate(&mut self, key: &str) {
        self.counter += 1;
        self.latest.insert(key.to_string(), self.counter);
    }
}
