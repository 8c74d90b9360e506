//! Per-service, per-location response cache.
//!
//! A service's TTL is learned from the `Cache-Control` header of its first
//! successful response and kept for the life of the process. Until a TTL is
//! learned nothing is served from cache for that service.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use chrono::{DateTime, Utc};
use shared::protocol::MAX_AGE_DIRECTIVE;
use shared::types::Location;
use crate::document::Document;
use crate::service::ServiceId;

/// Exact-match cache key for a location. Coordinates are compared bit for bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocationKey {
    latitude: u64,
    longitude: u64,
}

impl From<Location> for LocationKey {
    fn from(location: Location) -> Self {
        Self {
            latitude: location.latitude.to_bits(),
            longitude: location.longitude.to_bits(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    document: Document,
    captured_at: DateTime<Utc>,
}

impl CacheEntry {
    fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.captured_at).to_std().unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Default)]
pub struct TtlCache {
    entries: RwLock<HashMap<(LocationKey, ServiceId), CacheEntry>>,
    /// Learned TTL per service; absent means never learned
    ttls: RwLock<HashMap<ServiceId, Duration>>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a fresh cached response, or None on any kind of miss.
    pub fn lookup(&self, location: Location, id: &ServiceId) -> Option<Document> {
        self.lookup_at(location, id, Utc::now())
    }

    pub fn lookup_at(
        &self,
        location: Location,
        id: &ServiceId,
        now: DateTime<Utc>,
    ) -> Option<Document> {
        let Some(ttl) = self.ttl(id) else {
            tracing::debug!("Cache miss for {}: no TTL learned", id);
            return None;
        };

        let entries = self.entries.read().ok()?;
        let Some(entry) = entries.get(&(LocationKey::from(location), id.clone())) else {
            tracing::debug!("Cache miss for {}: entry not in cache", id);
            return None;
        };

        if entry.age(now) < ttl {
            tracing::debug!("Cache hit for {}", id);
            Some(entry.document.clone())
        } else {
            tracing::debug!("Cache miss for {}: exceeded max-age", id);
            None
        }
    }

    /// Record a response, overwriting whatever was cached for the key.
    pub fn store(
        &self,
        location: Location,
        id: ServiceId,
        document: Document,
        captured_at: DateTime<Utc>,
    ) {
        if let Ok(mut guard) = self.entries.write() {
            guard.insert(
                (LocationKey::from(location), id),
                CacheEntry { document, captured_at },
            );
        }
    }

    /// Learn a service's TTL from a `Cache-Control` header value.
    ///
    /// Only the first usable value is kept; later calls are no-ops even if the
    /// header changes. Returns the TTL in effect afterwards.
    pub fn learn_ttl(&self, id: &ServiceId, cache_control: Option<&str>) -> Option<Duration> {
        if let Some(ttl) = self.ttl(id) {
            return Some(ttl);
        }

        let Some(parsed) = cache_control.and_then(parse_max_age) else {
            tracing::debug!("No usable max-age from {}; TTL stays unlearned", id);
            return None;
        };

        let mut guard = self.ttls.write().ok()?;
        let ttl = *guard.entry(id.clone()).or_insert(parsed);
        tracing::debug!("Learned TTL {:?} for {}", ttl, id);
        Some(ttl)
    }

    pub fn ttl(&self, id: &ServiceId) -> Option<Duration> {
        self.ttls.read().ok()?.get(id).copied()
    }

    /// Drop entries captured longer ago than `max_age`. Returns how many went.
    pub fn prune_older_than(&self, max_age: Duration, now: DateTime<Utc>) -> usize {
        let Ok(mut guard) = self.entries.write() else {
            return 0;
        };
        let before = guard.len();
        guard.retain(|_, entry| entry.age(now) <= max_age);
        before - guard.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().map(|g| g.len()).unwrap_or(0)
    }
}

/// Extract `max-age=<seconds>` from a `Cache-Control` header value.
/// Non-positive or malformed values yield None.
pub fn parse_max_age(header: &str) -> Option<Duration> {
    header.split(',').find_map(|directive| {
        let (name, value) = directive.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case(MAX_AGE_DIRECTIVE) {
            return None;
        }
        let secs: f64 = value.trim().trim_matches('"').parse().ok()?;
        if secs > 0.0 {
            Duration::try_from_secs_f64(secs).ok()
        } else {
            None
        }
    })
}
