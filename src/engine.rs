//! The public engine facade (§4.8, §6): ties the codec, cache,
//! published-record set, query set, and scheduler together behind a
//! synchronous `feed`/`drain`/`next_deadline` API.
//!
//! Corresponds to the teacher's `servers.rs`/`datastore.rs` role of owning
//! state and wiring components together, but carries no `tokio`, no
//! channels, and no internal locking — every operation is driven by the
//! host passing in a monotonic [`Instant`] (§5).

use std::net::Ipv4Addr;
use std::time::Instant;

use log::warn;

use crate::cache::{Cache, CacheOutcome};
use crate::domain::DomainName;
use crate::dispatch::{self, RecvCallback};
use crate::error::{MdnsError, ParseError};
use crate::published::{ConflictCallback, PublishedSet, RecordHandle};
use crate::query::{AnswerCallback, QuerySet};
use crate::rdata::Rdata;
use crate::scheduler::{Outgoing, Scheduler};

/// Default IN class code (§6).
pub const CLASS_IN: u16 = crate::rdata::CLASS_IN;
/// Default maximum outbound datagram size (§6).
pub const DEFAULT_FRAME_SIZE: usize = 4096;

pub struct Engine {
    published: PublishedSet,
    cache: Cache,
    query_set: QuerySet,
    scheduler: Scheduler,
    recv_cb: Option<RecvCallback>,
}

impl Engine {
    pub fn new(frame_size: usize) -> Self {
        Engine {
            published: PublishedSet::new(),
            cache: Cache::new(),
            query_set: QuerySet::new(),
            scheduler: Scheduler::new(frame_size),
            recv_cb: None,
        }
    }

    /// Hands the engine a received datagram. Malformed input is logged
    /// and dropped; engine state is otherwise untouched (§4.1, §7).
    pub fn feed(
        &mut self,
        packet: &[u8],
        src_addr: Ipv4Addr,
        src_port: u16,
        now: Instant,
    ) -> Result<(), ParseError> {
        let message = match crate::codec::parse(packet) {
            Ok(message) => message,
            Err(err) => {
                warn!("dropping malformed mDNS datagram from {src_addr}:{src_port}: {err}");
                return Err(err);
            }
        };
        dispatch::dispatch(
            &message,
            src_addr,
            src_port,
            now,
            &mut self.published,
            &mut self.cache,
            &mut self.query_set,
            &mut self.scheduler,
            &mut self.recv_cb,
        );
        Ok(())
    }

    /// Runs housekeeping (cache expiry) then asks the scheduler for the
    /// next outbound packet, if any. Call in a loop until `None`.
    pub fn drain(&mut self, now: Instant) -> Option<Outgoing> {
        for expired in self.cache.sweep(now) {
            self.query_set.notify(&expired);
        }
        for expired in self.cache.maybe_full_sweep(now) {
            self.query_set.notify(&expired);
        }
        self.scheduler
            .drain(now, &mut self.published, &mut self.query_set, &self.cache)
    }

    pub fn next_deadline(&self, now: Instant) -> std::time::Duration {
        self.scheduler
            .next_deadline(now, &self.published, &self.query_set, &self.cache)
    }

    pub fn publish_shared(
        &mut self,
        name: DomainName,
        rr_type: u16,
        ttl: u32,
        now: Instant,
    ) -> Result<RecordHandle, MdnsError> {
        self.published.publish_shared(name, rr_type, ttl, now)
    }

    pub fn publish_unique(
        &mut self,
        name: DomainName,
        rr_type: u16,
        ttl: u32,
        on_conflict: ConflictCallback,
        now: Instant,
    ) -> Result<RecordHandle, MdnsError> {
        self.published
            .publish_unique(name, rr_type, ttl, on_conflict, now)
    }

    pub fn set_rdata_a(&mut self, handle: RecordHandle, addr: Ipv4Addr) -> Result<(), MdnsError> {
        self.published.set_rdata(handle, Rdata::A(addr))
    }

    pub fn set_rdata_name(&mut self, handle: RecordHandle, name: DomainName) -> Result<(), MdnsError> {
        let rr_type = self
            .published
            .get(handle)
            .ok_or_else(|| MdnsError::InvalidArgument("unknown record handle".into()))?
            .rr_type;
        let rdata = match rr_type {
            crate::rdata::rtype::NS => Rdata::Ns(name),
            crate::rdata::rtype::CNAME => Rdata::Cname(name),
            crate::rdata::rtype::PTR => Rdata::Ptr(name),
            other => {
                return Err(MdnsError::InvalidArgument(format!(
                    "rr_type {other} does not take a bare-name rdata"
                )))
            }
        };
        self.published.set_rdata(handle, rdata)
    }

    pub fn set_rdata_srv(
        &mut self,
        handle: RecordHandle,
        priority: u16,
        weight: u16,
        port: u16,
        target: DomainName,
    ) -> Result<(), MdnsError> {
        self.published.set_rdata(
            handle,
            Rdata::Srv {
                priority,
                weight,
                port,
                target,
            },
        )
    }

    pub fn set_rdata_raw(&mut self, handle: RecordHandle, bytes: Vec<u8>) -> Result<(), MdnsError> {
        self.published.set_rdata(handle, Rdata::Raw(bytes))
    }

    pub fn withdraw(&mut self, handle: RecordHandle) -> Result<(), MdnsError> {
        self.published.withdraw(handle)
    }

    pub fn query(
        &mut self,
        name: DomainName,
        qtype: u16,
        answer_cb: Option<AnswerCallback>,
        now: Instant,
    ) {
        match answer_cb {
            None => self.query_set.remove(&name, qtype),
            Some(mut answer_cb) => {
                let initial_next_try = self
                    .cache
                    .earliest_matching_expiry(&name, qtype)
                    .unwrap_or(now);
                for cached in self.cache.matching(&name, qtype) {
                    answer_cb(&cached.rr);
                }
                self.query_set.upsert(name, qtype, answer_cb, initial_next_try);
            }
        }
    }

    pub fn set_recv_callback(&mut self, cb: Option<RecvCallback>) {
        self.recv_cb = cb;
    }

    /// Marks all published records for withdrawal; further publish calls
    /// fail with [`MdnsError::ShuttingDown`].
    pub fn shutdown(&mut self) {
        self.published.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdata::rtype;

    #[test]
    fn shared_record_announces_without_probing() {
        let mut engine = Engine::new(DEFAULT_FRAME_SIZE);
        let now = Instant::now();
        let handle = engine
            .publish_shared(DomainName::from_str("foo.local").unwrap(), rtype::A, 120, now)
            .unwrap();
        engine.set_rdata_a(handle, Ipv4Addr::new(10, 0, 0, 5)).unwrap();
        let outgoing = engine.drain(now);
        assert!(outgoing.is_some());
    }

    #[test]
    fn query_is_answered_immediately_from_existing_cache() {
        let mut engine = Engine::new(DEFAULT_FRAME_SIZE);
        let now = Instant::now();
        let rr = crate::rdata::ResourceRecord::new(
            DomainName::from_str("foo.local").unwrap(),
            CLASS_IN,
            120,
            Rdata::A(Ipv4Addr::new(10, 0, 0, 1)),
        );
        if let CacheOutcome::Inserted(_) = engine.cache.insert(rr, now) {
            // already populated
        }
        let seen = std::rc::Rc::new(std::cell::RefCell::new(0));
        let seen2 = seen.clone();
        engine.query(
            DomainName::from_str("foo.local").unwrap(),
            rtype::A,
            Some(Box::new(move |_| {
                *seen2.borrow_mut() += 1;
                crate::query::CallbackAction::Keep
            })),
            now,
        );
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn shutdown_blocks_further_publishing() {
        let mut engine = Engine::new(DEFAULT_FRAME_SIZE);
        let now = Instant::now();
        engine.shutdown();
        assert!(engine
            .publish_shared(DomainName::from_str("foo.local").unwrap(), rtype::A, 120, now)
            .is_err());
    }
}
