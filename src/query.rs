//! Outstanding questions the daemon is asking on the host's behalf, each
//! with its own linear-backoff retry schedule and answer callback.

use std::time::{Duration, Instant};

use crate::domain::DomainName;
use crate::rdata::{rtype, ResourceRecord};

/// What the host's callback wants done with the query after being invoked.
pub enum CallbackAction {
    Keep,
    Remove,
}

pub type AnswerCallback = Box<dyn FnMut(&ResourceRecord) -> CallbackAction>;

/// Number of attempts after which a query is considered "satisfied" and
/// stops actively re-asking (§4.5).
const SATISFIED_AFTER_TRIES: u8 = 3;

pub struct Query {
    pub name: DomainName,
    pub qtype: u16,
    pub next_try: Instant,
    pub tries: u8,
    answer_cb: AnswerCallback,
}

impl Query {
    fn matches(&self, rr: &ResourceRecord) -> bool {
        self.name == rr.name && (self.qtype == rr.rr_type || self.qtype == rtype::ANY)
    }
}

pub struct QuerySet {
    queries: Vec<Query>,
}

impl QuerySet {
    pub fn new() -> Self {
        QuerySet {
            queries: Vec::new(),
        }
    }

    /// Registers (or re-registers) interest in `(name, qtype)`. If a query
    /// already exists for this pair, only its callback is replaced;
    /// outstanding retry state is left untouched.
    pub fn upsert(
        &mut self,
        name: DomainName,
        qtype: u16,
        answer_cb: AnswerCallback,
        initial_next_try: Instant,
    ) {
        if let Some(existing) = self
            .queries
            .iter_mut()
            .find(|q| q.name == name && q.qtype == qtype)
        {
            existing.answer_cb = answer_cb;
        } else {
            self.queries.push(Query {
                name,
                qtype,
                next_try: initial_next_try,
                tries: 0,
                answer_cb,
            });
        }
    }

    /// Cancels an outstanding query; cached records it referenced remain
    /// cached but lose their back-link.
    pub fn remove(&mut self, name: &DomainName, qtype: u16) {
        self.queries.retain(|q| !(&q.name == name && q.qtype == qtype));
    }

    pub fn get(&self, name: &DomainName, qtype: u16) -> Option<&Query> {
        self.queries.iter().find(|q| &q.name == name && q.qtype == qtype)
    }

    /// Queries whose `next_try` has elapsed, i.e. due to go out in the
    /// next outgoing packet.
    pub fn due(&self, now: Instant) -> Vec<(DomainName, u16)> {
        self.queries
            .iter()
            .filter(|q| q.next_try <= now)
            .map(|q| (q.name.clone(), q.qtype))
            .collect()
    }

    /// Called once a question for `(name, qtype)` has actually been
    /// placed in an outgoing packet: advances the retry schedule.
    /// `next_cache_expiry` is consulted once the query is "satisfied"
    /// (§4.5's cache-driven `next_try` recomputation).
    pub fn mark_sent(
        &mut self,
        name: &DomainName,
        qtype: u16,
        now: Instant,
        next_cache_expiry: Option<Instant>,
    ) {
        if let Some(query) = self
            .queries
            .iter_mut()
            .find(|q| &q.name == name && q.qtype == qtype)
        {
            if query.tries < SATISFIED_AFTER_TRIES {
                let delay = Duration::from_secs(query.tries as u64 + 1);
                query.tries += 1;
                query.next_try = now + delay;
            } else {
                query.next_try = next_cache_expiry.unwrap_or(now + Duration::from_secs(3600));
            }
        }
    }

    /// Invokes the matching queries' callback with a freshly cached (or
    /// expired, `ttl=0`) record, removing any query whose callback asked
    /// to stop.
    pub fn notify(&mut self, rr: &ResourceRecord) {
        let mut to_remove = Vec::new();
        for (index, query) in self.queries.iter_mut().enumerate() {
            if query.matches(rr) {
                if let CallbackAction::Remove = (query.answer_cb)(rr) {
                    to_remove.push(index);
                }
            }
        }
        for index in to_remove.into_iter().rev() {
            self.queries.remove(index);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Query> {
        self.queries.iter()
    }
}

impl Default for QuerySet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    use crate::rdata::{Rdata, CLASS_IN};

    #[test]
    fn upsert_twice_replaces_callback_not_retry_state() {
        let now = Instant::now();
        let mut set = QuerySet::new();
        let name = DomainName::from_str("foo.local").unwrap();
        set.upsert(name.clone(), rtype::A, Box::new(|_| CallbackAction::Keep), now);
        set.mark_sent(&name, rtype::A, now, None);
        let tries_before = set.get(&name, rtype::A).unwrap().tries;
        set.upsert(name.clone(), rtype::A, Box::new(|_| CallbackAction::Keep), now);
        assert_eq!(set.get(&name, rtype::A).unwrap().tries, tries_before);
    }

    #[test]
    fn linear_backoff_matches_one_two_three_seconds() {
        let now = Instant::now();
        let mut set = QuerySet::new();
        let name = DomainName::from_str("foo.local").unwrap();
        set.upsert(name.clone(), rtype::A, Box::new(|_| CallbackAction::Keep), now);
        set.mark_sent(&name, rtype::A, now, None);
        assert_eq!(set.get(&name, rtype::A).unwrap().next_try, now + Duration::from_secs(1));
        set.mark_sent(&name, rtype::A, now, None);
        assert_eq!(set.get(&name, rtype::A).unwrap().next_try, now + Duration::from_secs(2));
        set.mark_sent(&name, rtype::A, now, None);
        assert_eq!(set.get(&name, rtype::A).unwrap().next_try, now + Duration::from_secs(3));
        assert_eq!(set.get(&name, rtype::A).unwrap().tries, 3);
    }

    #[test]
    fn notify_invokes_only_matching_queries() {
        let now = Instant::now();
        let mut set = QuerySet::new();
        let name = DomainName::from_str("foo.local").unwrap();
        let other = DomainName::from_str("bar.local").unwrap();
        let seen = std::rc::Rc::new(std::cell::RefCell::new(0));
        let seen2 = seen.clone();
        set.upsert(
            name.clone(),
            rtype::A,
            Box::new(move |_| {
                *seen2.borrow_mut() += 1;
                CallbackAction::Keep
            }),
            now,
        );
        let rr = ResourceRecord::new(other, CLASS_IN, 10, Rdata::A(Ipv4Addr::new(10, 0, 0, 1)));
        set.notify(&rr);
        assert_eq!(*seen.borrow(), 0);
    }
}
