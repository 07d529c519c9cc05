//! Input dispatcher (§4.7): feeds parsed questions to the published-record
//! set and parsed answers to the query set and the answered-record cache.

use std::net::Ipv4Addr;
use std::time::Instant;

use crate::cache::{Cache, CacheOutcome};
use crate::message::Message;
use crate::published::{Mode, PublishedSet};
use crate::query::QuerySet;
use crate::rdata::ResourceRecord;
use crate::scheduler::{Scheduler, MULTICAST_PORT};

pub type RecvCallback = Box<dyn FnMut(&ResourceRecord)>;

/// True if `authority` carries a record for `(name, rr_type)` whose rdata
/// differs from `candidate` — the probing-time conflict check (§4.4).
fn authority_conflicts(authority: &[ResourceRecord], candidate: &ResourceRecord) -> bool {
    authority
        .iter()
        .any(|rr| rr.name == candidate.name && rr.rr_type == candidate.rr_type && rr.rdata != candidate.rdata)
}

/// True if `answers` already lists `candidate` — known-answer suppression
/// (§4.6). `rdata_matches` compares type/rdata only; the caller already
/// restricts `candidate` to the question's name. TTL is deliberately not
/// compared: per RFC 6762, peers normally report a decremented remaining
/// TTL in their known-answer section, so comparing TTLs would make
/// suppression miss in the common case.
fn already_known(answers: &[ResourceRecord], candidate: &ResourceRecord) -> bool {
    answers.iter().any(|rr| rr.rdata_matches(candidate))
}

#[allow(clippy::too_many_arguments)]
pub fn dispatch(
    message: &Message,
    src_addr: Ipv4Addr,
    src_port: u16,
    now: Instant,
    published: &mut PublishedSet,
    cache: &mut Cache,
    query_set: &mut QuerySet,
    scheduler: &mut Scheduler,
    recv_cb: &mut Option<RecvCallback>,
) {
    if message.is_query() {
        dispatch_question(message, src_addr, src_port, now, published, scheduler);
    } else {
        dispatch_answer(message, now, published, cache, query_set, recv_cb);
    }
}

fn dispatch_question(
    message: &Message,
    src_addr: Ipv4Addr,
    src_port: u16,
    now: Instant,
    published: &mut PublishedSet,
    scheduler: &mut Scheduler,
) {
    for question in &message.questions {
        let handles: Vec<_> = published
            .handles_matching(&question.name, question.qtype)
            .collect();
        for handle in handles {
            let (candidate, is_probing) = {
                let record = match published.get(handle) {
                    Some(record) => record,
                    None => continue,
                };
                (record.as_rr(), record.is_probing())
            };

            if is_probing {
                if authority_conflicts(&message.authority, &candidate) {
                    if let Some(record) = published.get_mut(handle) {
                        if let Some(cb) = record.conflict_cb.as_mut() {
                            cb();
                        }
                    }
                    published.drop_record(handle);
                }
                continue;
            }

            if already_known(&message.answers, &candidate) {
                continue;
            }

            let record = published.get_mut(handle).unwrap();
            let is_unique = matches!(record.mode, Mode::Unique { .. });
            if is_unique {
                record.scheduled = crate::published::Scheduled::Now;
            } else {
                let deadline = scheduler.pause_deadline(now);
                record.scheduled = crate::published::Scheduled::Pause(deadline);
            }

            if src_port != MULTICAST_PORT {
                scheduler.queue_unicast(message.header.id, src_addr, src_port, question.clone(), candidate);
            }
        }
    }
}

fn dispatch_answer(
    message: &Message,
    now: Instant,
    published: &mut PublishedSet,
    cache: &mut Cache,
    query_set: &mut QuerySet,
    recv_cb: &mut Option<RecvCallback>,
) {
    for answer in &message.answers {
        let conflicting_handle = published.iter().find_map(|(handle, record)| {
            if record.name == answer.name
                && record.rr_type == answer.rr_type
                && matches!(record.mode, Mode::Unique { .. })
                && record.rdata != answer.rdata
            {
                Some(handle)
            } else {
                None
            }
        });
        if let Some(handle) = conflicting_handle {
            if let Some(record) = published.get_mut(handle) {
                if let Some(cb) = record.conflict_cb.as_mut() {
                    cb();
                }
            }
            published.drop_record(handle);
        }

        if let Some(cb) = recv_cb.as_mut() {
            cb(answer);
        }

        match cache.insert(answer.clone(), now) {
            CacheOutcome::Inserted(cached) => query_set.notify(&cached.rr),
            CacheOutcome::Goodbye(goodbye) => query_set.notify(&goodbye),
        }
    }
}
