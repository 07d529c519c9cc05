//! The daemon's own record set: shared records (no uniqueness claim) and
//! unique records (pass a probing phase before announcement).
//!
//! List membership is modeled as a single field on each record rather
//! than four separate list structures (§9 design note): moving a record
//! to a new list is just overwriting `scheduled`, which keeps the
//! "a record is in at most one list" invariant true by construction.

use std::collections::HashMap;
use std::time::Instant;

use crate::domain::DomainName;
use crate::error::MdnsError;
use crate::rdata::{Rdata, ResourceRecord, CLASS_CACHE_FLUSH, CLASS_IN};

pub type RecordHandle = u64;
pub type ConflictCallback = Box<dyn FnMut()>;

/// Whether a record needs to pass probing before it may be announced.
pub enum Mode {
    Shared,
    Unique { probe_count: u8 },
}

/// Which of the output scheduler's four lists a record currently belongs
/// to, with that list's next-fire deadline where relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduled {
    None,
    Now,
    Pause(Instant),
    Probe(Instant),
    Publish(Instant),
}

pub struct PublishedRecord {
    pub name: DomainName,
    pub rr_type: u16,
    pub class: u16,
    pub ttl: u32,
    pub rdata: Rdata,
    pub mode: Mode,
    pub tries: u8,
    pub last_sent_at: Option<Instant>,
    pub conflict_cb: Option<ConflictCallback>,
    pub scheduled: Scheduled,
}

impl PublishedRecord {
    pub fn as_rr(&self) -> ResourceRecord {
        ResourceRecord {
            name: self.name.clone(),
            rr_type: self.rr_type,
            class: self.class,
            ttl: self.ttl,
            rdata: self.rdata.clone(),
        }
    }

    pub fn is_probing(&self) -> bool {
        matches!(self.mode, Mode::Unique { probe_count } if probe_count < 5)
    }
}

pub struct PublishedSet {
    records: HashMap<RecordHandle, PublishedRecord>,
    next_handle: RecordHandle,
    shutting_down: bool,
}

impl PublishedSet {
    pub fn new() -> Self {
        PublishedSet {
            records: HashMap::new(),
            next_handle: 1,
            shutting_down: false,
        }
    }

    fn alloc_handle(&mut self) -> RecordHandle {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn check_not_shutting_down(&self) -> Result<(), MdnsError> {
        if self.shutting_down {
            Err(MdnsError::ShuttingDown)
        } else {
            Ok(())
        }
    }

    /// Inserts a shared record and enqueues it onto the `publish` list to
    /// begin its announcement cadence immediately.
    pub fn publish_shared(
        &mut self,
        name: DomainName,
        rr_type: u16,
        ttl: u32,
        now: Instant,
    ) -> Result<RecordHandle, MdnsError> {
        self.check_not_shutting_down()?;
        let handle = self.alloc_handle();
        self.records.insert(
            handle,
            PublishedRecord {
                name,
                rr_type,
                class: CLASS_IN,
                ttl,
                rdata: Rdata::Raw(Vec::new()),
                mode: Mode::Shared,
                tries: 0,
                last_sent_at: None,
                conflict_cb: None,
                scheduled: Scheduled::Publish(now),
            },
        );
        Ok(handle)
    }

    /// Inserts a unique record and enqueues it onto the `probe` list.
    pub fn publish_unique(
        &mut self,
        name: DomainName,
        rr_type: u16,
        ttl: u32,
        on_conflict: ConflictCallback,
        now: Instant,
    ) -> Result<RecordHandle, MdnsError> {
        self.check_not_shutting_down()?;
        let handle = self.alloc_handle();
        self.records.insert(
            handle,
            PublishedRecord {
                name,
                rr_type,
                class: CLASS_IN | CLASS_CACHE_FLUSH,
                ttl,
                rdata: Rdata::Raw(Vec::new()),
                mode: Mode::Unique { probe_count: 1 },
                tries: 0,
                last_sent_at: None,
                conflict_cb: Some(on_conflict),
                scheduled: Scheduled::Probe(now),
            },
        );
        Ok(handle)
    }

    /// Sets a record's rdata. Any setter triggers re-announcement once the
    /// record has cleared probing.
    pub fn set_rdata(&mut self, handle: RecordHandle, rdata: Rdata) -> Result<(), MdnsError> {
        let record = self
            .records
            .get_mut(&handle)
            .ok_or_else(|| MdnsError::InvalidArgument("unknown record handle".into()))?;
        let incoming_type = rdata.rr_type();
        if !matches!(rdata, Rdata::Raw(_)) && incoming_type != record.rr_type {
            return Err(MdnsError::InvalidArgument(format!(
                "record declared as rr_type {} cannot take rdata of rr_type {incoming_type}",
                record.rr_type
            )));
        }
        record.rdata = rdata;
        let published = matches!(record.mode, Mode::Shared)
            || matches!(record.mode, Mode::Unique { probe_count } if probe_count >= 5);
        if published {
            record.scheduled = Scheduled::Now;
        }
        Ok(())
    }

    /// Withdraws a record: silently if still probing, otherwise schedules
    /// a goodbye (`ttl=0`) for the next drain.
    pub fn withdraw(&mut self, handle: RecordHandle) -> Result<(), MdnsError> {
        let record = self
            .records
            .get_mut(&handle)
            .ok_or_else(|| MdnsError::InvalidArgument("unknown record handle".into()))?;
        if record.is_probing() {
            self.records.remove(&handle);
            return Ok(());
        }
        record.ttl = 0;
        record.scheduled = Scheduled::Now;
        Ok(())
    }

    pub fn drop_record(&mut self, handle: RecordHandle) -> Option<PublishedRecord> {
        self.records.remove(&handle)
    }

    pub fn get(&self, handle: RecordHandle) -> Option<&PublishedRecord> {
        self.records.get(&handle)
    }

    pub fn get_mut(&mut self, handle: RecordHandle) -> Option<&mut PublishedRecord> {
        self.records.get_mut(&handle)
    }

    pub fn move_to(&mut self, handle: RecordHandle, scheduled: Scheduled) {
        if let Some(record) = self.records.get_mut(&handle) {
            record.scheduled = scheduled;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (RecordHandle, &PublishedRecord)> {
        self.records.iter().map(|(h, r)| (*h, r))
    }

    pub fn handles_matching<'a>(
        &'a self,
        name: &'a DomainName,
        rr_type: u16,
    ) -> impl Iterator<Item = RecordHandle> + 'a {
        self.records.iter().filter_map(move |(h, r)| {
            if &r.name == name && (r.rr_type == rr_type || rr_type == crate::rdata::rtype::ANY) {
                Some(*h)
            } else {
                None
            }
        })
    }

    /// Marks every record for withdrawal. Further `publish_*` calls fail.
    pub fn shutdown(&mut self) {
        self.shutting_down = true;
        for record in self.records.values_mut() {
            record.ttl = 0;
            record.scheduled = Scheduled::Now;
        }
    }
}

impl Default for PublishedSet {
    fn default() -> Self {
        Self::new()
    }
}
