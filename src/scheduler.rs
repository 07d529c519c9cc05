//! The output scheduler: decides what goes into the next outbound
//! packet. Owns the unicast-response queue; the four multicast lists
//! (`now`, `pause`, `probe`, `publish`) live as a single `scheduled`
//! field on each [`crate::published::PublishedRecord`] (§9 design note).

use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use crate::cache::Cache;
use crate::header::Header;
use crate::message::Message;
use crate::published::{Mode, PublishedSet, RecordHandle, Scheduled};
use crate::query::QuerySet;
use crate::rdata::{Question, ResourceRecord, CLASS_IN};

pub const MULTICAST_ADDR: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 251);
pub const MULTICAST_PORT: u16 = 5353;

const PROBE_INTERVAL: Duration = Duration::from_millis(250);
const PUBLISH_INTERVAL: Duration = Duration::from_secs(2);
const PUBLISH_MAX_TRIES: u8 = 4;
const PAUSE_JITTER_MIN_MS: u64 = 20;
const PAUSE_JITTER_MAX_MS: u64 = 120;
/// Refresh a little before the wire TTL actually lapses.
const TTL_REFRESH_MARGIN: Duration = Duration::from_secs(2);

pub struct Outgoing {
    pub packet: Vec<u8>,
    pub dst_addr: Ipv4Addr,
    pub dst_port: u16,
}

struct UnicastEntry {
    transaction_id: u16,
    dst_addr: Ipv4Addr,
    dst_port: u16,
    question: Question,
    answer: ResourceRecord,
}

/// Small deterministic xorshift, used only to jitter the `pause` list's
/// suppression window (§4.6). Not cryptographic; seeded fixed so tests
/// stay reproducible, matching the engine's "no clock of its own" design.
struct Jitter {
    state: u64,
}

impl Jitter {
    fn new() -> Self {
        Jitter {
            state: 0x9e3779b97f4a7c15,
        }
    }

    fn next_in_range(&mut self, lo: u64, hi: u64) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        lo + (self.state % (hi - lo + 1))
    }
}

pub struct Scheduler {
    unicast: VecDeque<UnicastEntry>,
    frame_size: usize,
    jitter: Jitter,
}

impl Scheduler {
    pub fn new(frame_size: usize) -> Self {
        Scheduler {
            unicast: VecDeque::new(),
            frame_size,
            jitter: Jitter::new(),
        }
    }

    pub fn queue_unicast(
        &mut self,
        transaction_id: u16,
        dst_addr: Ipv4Addr,
        dst_port: u16,
        question: Question,
        answer: ResourceRecord,
    ) {
        self.unicast.push_back(UnicastEntry {
            transaction_id,
            dst_addr,
            dst_port,
            question,
            answer,
        });
    }

    pub fn pause_deadline(&mut self, now: Instant) -> Instant {
        now + Duration::from_millis(self.jitter.next_in_range(PAUSE_JITTER_MIN_MS, PAUSE_JITTER_MAX_MS))
    }

    /// Assembles the next outbound packet, if any. Mirrors §4.6's
    /// per-packet assembly order: unicast first, then multicast answers,
    /// then multicast questions.
    pub fn drain(
        &mut self,
        now: Instant,
        published: &mut PublishedSet,
        query_set: &mut QuerySet,
        cache: &Cache,
    ) -> Option<Outgoing> {
        if let Some(entry) = self.unicast.pop_front() {
            let mut header = Header::default().as_answer();
            header.id = entry.transaction_id;
            let message = Message {
                header,
                questions: vec![entry.question],
                answers: vec![entry.answer],
                authority: vec![],
                additional: vec![],
            };
            if let Ok(packet) = crate::codec::encode(&message, self.frame_size) {
                return Some(Outgoing {
                    packet,
                    dst_addr: entry.dst_addr,
                    dst_port: entry.dst_port,
                });
            }
            return None;
        }

        if let Some(packet) = self.drain_answers(now, published) {
            return Some(Outgoing {
                packet,
                dst_addr: MULTICAST_ADDR,
                dst_port: MULTICAST_PORT,
            });
        }

        if let Some(packet) = self.drain_questions(now, published, query_set, cache) {
            return Some(Outgoing {
                packet,
                dst_addr: MULTICAST_ADDR,
                dst_port: MULTICAST_PORT,
            });
        }

        None
    }

    fn due_answer_handles(&self, now: Instant, published: &PublishedSet) -> Vec<RecordHandle> {
        published
            .iter()
            .filter(|(_, record)| match record.scheduled {
                Scheduled::Now => true,
                Scheduled::Pause(deadline) | Scheduled::Publish(deadline) => deadline <= now,
                Scheduled::None | Scheduled::Probe(_) => false,
            })
            .map(|(handle, _)| handle)
            .collect()
    }

    fn drain_answers(&mut self, now: Instant, published: &mut PublishedSet) -> Option<Vec<u8>> {
        let mut header = Header::default().as_answer();
        header.id = 0;
        let mut message = Message {
            header,
            questions: vec![],
            answers: vec![],
            authority: vec![],
            additional: vec![],
        };

        for handle in self.due_answer_handles(now, published) {
            let rr = match published.get(handle) {
                Some(record) => record.as_rr(),
                None => continue,
            };
            message.answers.push(rr);
            let encoded_len = crate::codec::encode(&message, usize::MAX)
                .map(|bytes| bytes.len())
                .unwrap_or(usize::MAX);
            if encoded_len > self.frame_size {
                message.answers.pop();
                continue;
            }

            let record = published.get_mut(handle).unwrap();
            let was_publish = matches!(record.scheduled, Scheduled::Publish(_));
            if was_publish {
                record.tries += 1;
                record.last_sent_at = Some(now);
                if record.tries < PUBLISH_MAX_TRIES {
                    record.scheduled = Scheduled::Publish(now + PUBLISH_INTERVAL);
                } else {
                    record.scheduled = Scheduled::None;
                }
            } else {
                record.scheduled = Scheduled::None;
            }

            if record.ttl == 0 {
                published.drop_record(handle);
            }
        }

        if message.answers.is_empty() {
            None
        } else {
            crate::codec::encode(&message, self.frame_size).ok()
        }
    }

    fn drain_questions(
        &mut self,
        now: Instant,
        published: &mut PublishedSet,
        query_set: &mut QuerySet,
        cache: &Cache,
    ) -> Option<Vec<u8>> {
        let mut message = Message {
            header: Header::default(),
            questions: vec![],
            answers: vec![],
            authority: vec![],
            additional: vec![],
        };

        let probing_handles: Vec<RecordHandle> = published
            .iter()
            .filter(|(_, record)| matches!(record.scheduled, Scheduled::Probe(deadline) if deadline <= now))
            .map(|(handle, _)| handle)
            .collect();

        for handle in probing_handles {
            let (name, rr_type, rr, probe_count) = {
                let record = match published.get(handle) {
                    Some(record) => record,
                    None => continue,
                };
                let probe_count = match record.mode {
                    Mode::Unique { probe_count } => probe_count,
                    Mode::Shared => continue,
                };
                (record.name.clone(), record.rr_type, record.as_rr(), probe_count)
            };
            message.questions.push(Question {
                name: name.clone(),
                qtype: rr_type,
                qclass: CLASS_IN,
            });
            message.authority.push(rr);

            let record = published.get_mut(handle).unwrap();
            if probe_count >= PUBLISH_MAX_TRIES {
                record.mode = Mode::Unique { probe_count: 5 };
                record.scheduled = Scheduled::Publish(now);
            } else {
                record.mode = Mode::Unique {
                    probe_count: probe_count + 1,
                };
                record.scheduled = Scheduled::Probe(now + PROBE_INTERVAL);
            }
        }

        for (name, qtype) in query_set.due(now) {
            message.questions.push(Question {
                name: name.clone(),
                qtype,
                qclass: CLASS_IN,
            });
            let next_expiry = cache.earliest_matching_expiry(&name, qtype);
            query_set.mark_sent(&name, qtype, now, next_expiry);
        }

        if message.questions.is_empty() {
            None
        } else {
            crate::codec::encode(&message, self.frame_size).ok()
        }
    }

    /// Minimum wait before the host needs to call `drain` again.
    pub fn next_deadline(
        &self,
        now: Instant,
        published: &PublishedSet,
        query_set: &QuerySet,
        cache: &Cache,
    ) -> Duration {
        if !self.unicast.is_empty() {
            return Duration::ZERO;
        }

        let mut deadlines: Vec<Instant> = Vec::new();
        for (_, record) in published.iter() {
            match record.scheduled {
                Scheduled::Now => return Duration::ZERO,
                Scheduled::Pause(deadline) | Scheduled::Probe(deadline) | Scheduled::Publish(deadline) => {
                    deadlines.push(deadline);
                }
                Scheduled::None => {
                    if let (Some(last_sent), false) = (record.last_sent_at, record.ttl == 0) {
                        let refresh_at = last_sent + Duration::from_secs(record.ttl as u64) - TTL_REFRESH_MARGIN;
                        deadlines.push(refresh_at);
                    }
                }
            }
        }
        for query in query_set.iter() {
            deadlines.push(query.next_try);
        }
        if let Some(expiry) = cache.next_expiry() {
            deadlines.push(expiry);
        }
        if let Some(gc) = cache.next_gc_deadline() {
            deadlines.push(gc);
        } else {
            deadlines.push(now + crate::cache::GC_INTERVAL);
        }

        deadlines
            .into_iter()
            .map(|deadline| deadline.saturating_duration_since(now))
            .min()
            .unwrap_or(crate::cache::GC_INTERVAL)
    }
}
