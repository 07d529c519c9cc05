//! Resource record types and the `Rdata` variants this engine understands.
//!
//! Grounded in the teacher's `resourcerecord.rs`/`enums.rs` (`RecordType`,
//! `InternalResourceRecord`), narrowed to the types this engine's Non-goals
//! (§1 of SPEC_FULL.md) keep in scope: A, NS, CNAME, PTR, SRV, TXT, plus a
//! catch-all `Raw` for anything else the host wants to inject.

use std::net::Ipv4Addr;

use crate::domain::DomainName;

/// Well-known RR type codes used by this engine. Anything else decodes as
/// [`Rdata::Raw`].
pub mod rtype {
    pub const A: u16 = 1;
    pub const NS: u16 = 2;
    pub const CNAME: u16 = 5;
    pub const PTR: u16 = 12;
    pub const TXT: u16 = 16;
    pub const SRV: u16 = 33;
    pub const ANY: u16 = 255;
}

/// The high bit of the CLASS field, signalling "evict conflicting prior
/// records with this name" for unique mDNS records.
pub const CLASS_CACHE_FLUSH: u16 = 0x8000;
pub const CLASS_MASK: u16 = 0x7fff;
/// The Internet class.
pub const CLASS_IN: u16 = 1;

/// The decoded form of a resource record's RDATA, tagged by RR type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rdata {
    A(Ipv4Addr),
    Ns(DomainName),
    Cname(DomainName),
    Ptr(DomainName),
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: DomainName,
    },
    Txt(Vec<u8>),
    /// Opaque rdata for any RR type this engine doesn't natively decode;
    /// the host may also use this to inject rdata for types we don't know
    /// about (e.g. AAAA), per §1's Non-goals.
    Raw(Vec<u8>),
}

impl Rdata {
    /// The RR type code this rdata variant corresponds to when the value
    /// itself determines the type (used when publishing; `Raw` requires the
    /// caller to also carry an explicit type on the [`ResourceRecord`]).
    pub fn rr_type(&self) -> u16 {
        match self {
            Rdata::A(_) => rtype::A,
            Rdata::Ns(_) => rtype::NS,
            Rdata::Cname(_) => rtype::CNAME,
            Rdata::Ptr(_) => rtype::PTR,
            Rdata::Srv { .. } => rtype::SRV,
            Rdata::Txt(_) => rtype::TXT,
            Rdata::Raw(_) => 0,
        }
    }
}

/// A fully-decoded resource record, from the answer/authority/additional
/// sections of a [`crate::message::Message`], or published locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: DomainName,
    pub rr_type: u16,
    /// The raw CLASS field, including the cache-flush bit if set.
    pub class: u16,
    pub ttl: u32,
    pub rdata: Rdata,
}

impl ResourceRecord {
    pub fn new(name: DomainName, class: u16, ttl: u32, rdata: Rdata) -> Self {
        let rr_type = rdata.rr_type();
        ResourceRecord {
            name,
            rr_type,
            class,
            ttl,
            rdata,
        }
    }

    pub fn cache_flush(&self) -> bool {
        self.class & CLASS_CACHE_FLUSH != 0
    }

    pub fn class_code(&self) -> u16 {
        self.class & CLASS_MASK
    }

    /// A goodbye record: announces departure by setting `ttl=0`.
    pub fn as_goodbye(&self) -> ResourceRecord {
        let mut rr = self.clone();
        rr.ttl = 0;
        rr
    }

    /// Whether this record's rdata matches `other`'s, ignoring name/ttl.
    /// Used for conflict detection (§4.4) and known-answer suppression
    /// (§4.6), mirroring `_a_match` in the original mdnsd source.
    pub fn rdata_matches(&self, other: &ResourceRecord) -> bool {
        self.rr_type == other.rr_type && self.rdata == other.rdata
    }
}

/// A single entry of the question section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: DomainName,
    pub qtype: u16,
    pub qclass: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_flush_bit_is_isolated_from_class() {
        let rr = ResourceRecord::new(
            DomainName::from_str("foo.local").unwrap(),
            CLASS_IN | CLASS_CACHE_FLUSH,
            120,
            Rdata::A(Ipv4Addr::new(10, 0, 0, 1)),
        );
        assert!(rr.cache_flush());
        assert_eq!(rr.class_code(), CLASS_IN);
    }

    #[test]
    fn goodbye_zeroes_ttl_only() {
        let rr = ResourceRecord::new(
            DomainName::from_str("foo.local").unwrap(),
            CLASS_IN,
            120,
            Rdata::A(Ipv4Addr::new(10, 0, 0, 1)),
        );
        let goodbye = rr.as_goodbye();
        assert_eq!(goodbye.ttl, 0);
        assert_eq!(goodbye.name, rr.name);
    }
}
