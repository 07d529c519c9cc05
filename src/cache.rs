//! The answered-record cache: peer-announced resource records indexed by
//! `(name, type)` with monotonic-time expiry, cache-flush eviction, and
//! goodbye handling (§4.3).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::domain::DomainName;
use crate::rdata::ResourceRecord;

/// Margin added past `ttl/2` before a cached record is considered stale,
/// giving the host a window to re-query before peers actually expire it.
const REFRESH_MARGIN: Duration = Duration::from_secs(8);
/// Upper bound on how often the full-table sweep runs, matching mdnsd's
/// `GC` constant.
pub const GC_INTERVAL: Duration = Duration::from_secs(86_400);

#[derive(Debug, Clone)]
pub struct CachedRecord {
    pub rr: ResourceRecord,
    pub expires_at: Instant,
}

/// What happened as a result of inserting a freshly received record.
pub enum CacheOutcome {
    /// Recorded normally; carries the cached view for query notification.
    Inserted(CachedRecord),
    /// A `ttl=0` goodbye: the matching entry (if any) was evicted.
    Goodbye(ResourceRecord),
}

pub struct Cache {
    entries: HashMap<(DomainName, u16), CachedRecord>,
    last_gc: Option<Instant>,
}

impl Cache {
    pub fn new() -> Self {
        Cache {
            entries: HashMap::new(),
            last_gc: None,
        }
    }

    pub fn get(&self, name: &DomainName, rr_type: u16) -> Option<&CachedRecord> {
        self.entries.get(&(name.clone(), rr_type))
    }

    /// Inserts a received record, applying cache-flush eviction and
    /// goodbye semantics.
    pub fn insert(&mut self, rr: ResourceRecord, now: Instant) -> CacheOutcome {
        if rr.cache_flush() {
            self.entries.retain(|(name, _), _| name != &rr.name);
        }
        if rr.ttl == 0 {
            self.entries.remove(&(rr.name.clone(), rr.rr_type));
            return CacheOutcome::Goodbye(rr);
        }
        let expires_at = now + Duration::from_secs(rr.ttl as u64 / 2) + REFRESH_MARGIN;
        let cached = CachedRecord {
            rr: rr.clone(),
            expires_at,
        };
        self.entries.insert((rr.name, rr.rr_type), cached.clone());
        CacheOutcome::Inserted(cached)
    }

    /// Evicts every entry whose `expires_at` has passed, returning
    /// goodbye-shaped (`ttl=0`) copies of what was evicted so callers can
    /// notify matching queries.
    pub fn sweep(&mut self, now: Instant) -> Vec<ResourceRecord> {
        let expired: Vec<(DomainName, u16)> = self
            .entries
            .iter()
            .filter(|(_, cached)| cached.expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();
        let mut evicted = Vec::with_capacity(expired.len());
        for key in expired {
            if let Some(cached) = self.entries.remove(&key) {
                evicted.push(cached.rr.as_goodbye());
            }
        }
        evicted
    }

    /// Runs the daily full-table safety-net sweep if due, in addition to
    /// whatever per-tick sweeping the scheduler already does.
    pub fn maybe_full_sweep(&mut self, now: Instant) -> Vec<ResourceRecord> {
        let due = match self.last_gc {
            None => true,
            Some(last) => now.duration_since(last) >= GC_INTERVAL,
        };
        if !due {
            return Vec::new();
        }
        self.last_gc = Some(now);
        self.sweep(now)
    }

    /// Earliest expiry among cached entries matching `(name, type)`, used
    /// to seed a new query's retry schedule and to recompute a satisfied
    /// query's `next_try`.
    pub fn earliest_matching_expiry(&self, name: &DomainName, rr_type: u16) -> Option<Instant> {
        self.entries
            .iter()
            .filter(|((n, t), _)| n == name && *t == rr_type)
            .map(|(_, cached)| cached.expires_at)
            .min()
    }

    pub fn matching(&self, name: &DomainName, rr_type: u16) -> impl Iterator<Item = &CachedRecord> {
        self.entries
            .iter()
            .filter(move |((n, t), _)| n == name && *t == rr_type)
            .map(|(_, cached)| cached)
    }

    pub fn next_expiry(&self) -> Option<Instant> {
        self.entries.values().map(|cached| cached.expires_at).min()
    }

    pub fn next_gc_deadline(&self) -> Option<Instant> {
        self.last_gc.map(|last| last + GC_INTERVAL)
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    use crate::rdata::{Rdata, CLASS_CACHE_FLUSH, CLASS_IN};

    fn a_record(name: &str, ttl: u32, class: u16) -> ResourceRecord {
        ResourceRecord::new(
            DomainName::from_str(name).unwrap(),
            class,
            ttl,
            Rdata::A(Ipv4Addr::new(10, 0, 0, 1)),
        )
    }

    #[test]
    fn expiry_margin_is_half_ttl_plus_eight_seconds() {
        let now = Instant::now();
        let mut cache = Cache::new();
        cache.insert(a_record("foo.local", 10, CLASS_IN), now);
        let cached = cache.get(&DomainName::from_str("foo.local").unwrap(), crate::rdata::rtype::A).unwrap();
        assert_eq!(cached.expires_at, now + Duration::from_secs(5 + 8));
    }

    #[test]
    fn goodbye_evicts_without_inserting() {
        let now = Instant::now();
        let mut cache = Cache::new();
        cache.insert(a_record("foo.local", 10, CLASS_IN), now);
        let outcome = cache.insert(a_record("foo.local", 0, CLASS_IN), now);
        assert!(matches!(outcome, CacheOutcome::Goodbye(_)));
        assert!(cache.get(&DomainName::from_str("foo.local").unwrap(), crate::rdata::rtype::A).is_none());
    }

    #[test]
    fn cache_flush_evicts_other_types_for_same_name() {
        let now = Instant::now();
        let mut cache = Cache::new();
        let ptr = ResourceRecord::new(
            DomainName::from_str("foo.local").unwrap(),
            CLASS_IN,
            120,
            Rdata::Ptr(DomainName::from_str("bar.local").unwrap()),
        );
        cache.insert(ptr, now);
        cache.insert(a_record("foo.local", 120, CLASS_IN | CLASS_CACHE_FLUSH), now);
        assert!(cache
            .get(&DomainName::from_str("foo.local").unwrap(), crate::rdata::rtype::PTR)
            .is_none());
    }

    #[test]
    fn sweep_evicts_expired_entries_as_goodbyes() {
        let now = Instant::now();
        let mut cache = Cache::new();
        cache.insert(a_record("foo.local", 10, CLASS_IN), now);
        let evicted = cache.sweep(now + Duration::from_secs(14));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].ttl, 0);
    }
}
