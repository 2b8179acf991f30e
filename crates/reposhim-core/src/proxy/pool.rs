//! Idle curl handles kept per upstream host.
//!
//! A curl `Easy` handle owns its connection cache, so returning a handle to the
//! pool after a clean transfer keeps the upstream connection alive for the
//! next request to the same origin.

use super::key::HostKey;
use curl::easy::Easy;
use std::collections::HashMap;
use std::sync::Mutex;

pub const DEFAULT_CONNECTIONS_PER_HOST: usize = 20;

#[derive(Debug)]
pub struct ConnectionPool {
    per_host: usize,
    idle: Mutex<HashMap<HostKey, Vec<Easy>>>,
}

impl ConnectionPool {
    pub fn new(per_host: usize) -> Self {
        Self {
            per_host,
            idle: Mutex::new(HashMap::new()),
        }
    }

    /// Reset idle handle for `key`, or a fresh one.
    pub fn checkout(&self, key: &HostKey) -> Easy {
        let pooled = self
            .idle
            .lock()
            .ok()
            .and_then(|mut idle| idle.get_mut(key).and_then(Vec::pop));
        match pooled {
            Some(mut easy) => {
                easy.reset();
                easy
            }
            None => Easy::new(),
        }
    }

    /// Return a handle after a successful transfer. Dropped when the host
    /// already has `per_host` idle handles.
    pub fn checkin(&self, key: HostKey, easy: Easy) {
        let Ok(mut idle) = self.idle.lock() else {
            return;
        };
        let handles = idle.entry(key).or_default();
        if handles.len() < self.per_host {
            handles.push(easy);
        }
    }

    pub fn idle_count(&self, key: &HostKey) -> usize {
        self.idle
            .lock()
            .map(|idle| idle.get(key).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

impl Default for ConnectionPool {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECTIONS_PER_HOST)
    }
}
