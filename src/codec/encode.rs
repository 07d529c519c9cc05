//! Wire encoder with bounded name compression.
//!
//! Mirrors the decoder's pointer scheme in reverse: a small table of
//! previously-written name suffixes and the byte offset each was written
//! at, consulted longest-suffix-first so repeated owner/target names (the
//! common case for `_opcua-tcp._tcp.local` siblings) collapse to a
//! 2-byte pointer. Bounded to a fixed number of entries so publishing a
//! record set with many distinct names can't make compression itself
//! grow unbounded.

use crate::domain::DomainName;
use crate::error::ParseError;
use crate::header::Header;
use crate::message::Message;
use crate::rdata::{rtype, Question, Rdata, ResourceRecord};
use packed_struct::PackedStruct;

/// A pointer can only address the first 14 bits of offset space.
const MAX_POINTER_OFFSET: usize = 0x3fff;

struct NameCompressor {
    entries: Vec<(Vec<Vec<u8>>, u16)>,
}

impl NameCompressor {
    const MAX_ENTRIES: usize = 20;

    fn new() -> Self {
        NameCompressor {
            entries: Vec::new(),
        }
    }

    fn find(&self, suffix: &[Vec<u8>]) -> Option<u16> {
        self.entries
            .iter()
            .find(|(s, _)| s.as_slice() == suffix)
            .map(|(_, offset)| *offset)
    }

    fn register(&mut self, suffix: Vec<Vec<u8>>, offset: usize) {
        if self.entries.len() >= Self::MAX_ENTRIES || offset > MAX_POINTER_OFFSET {
            return;
        }
        self.entries.push((suffix, offset as u16));
    }
}

fn encode_name(buf: &mut Vec<u8>, compressor: &mut NameCompressor, name: &DomainName) {
    let labels = name.labels();
    let mut idx = 0;
    while idx < labels.len() {
        let suffix = &labels[idx..];
        if let Some(offset) = compressor.find(suffix) {
            let ptr = 0xC000u16 | offset;
            buf.extend_from_slice(&ptr.to_be_bytes());
            return;
        }
        compressor.register(suffix.to_vec(), buf.len());
        let label = &labels[idx];
        buf.push(label.len() as u8);
        buf.extend_from_slice(label);
        idx += 1;
    }
    buf.push(0);
}

fn encode_question(buf: &mut Vec<u8>, compressor: &mut NameCompressor, question: &Question) {
    encode_name(buf, compressor, &question.name);
    buf.extend_from_slice(&question.qtype.to_be_bytes());
    buf.extend_from_slice(&question.qclass.to_be_bytes());
}

fn encode_rdata(buf: &mut Vec<u8>, compressor: &mut NameCompressor, rdata: &Rdata) {
    match rdata {
        Rdata::A(addr) => buf.extend_from_slice(&addr.octets()),
        Rdata::Ns(name) | Rdata::Cname(name) | Rdata::Ptr(name) => {
            encode_name(buf, compressor, name)
        }
        Rdata::Srv {
            priority,
            weight,
            port,
            target,
        } => {
            buf.extend_from_slice(&priority.to_be_bytes());
            buf.extend_from_slice(&weight.to_be_bytes());
            buf.extend_from_slice(&port.to_be_bytes());
            encode_name(buf, compressor, target);
        }
        Rdata::Txt(bytes) | Rdata::Raw(bytes) => buf.extend_from_slice(bytes),
    }
}

fn encode_rr(buf: &mut Vec<u8>, compressor: &mut NameCompressor, rr: &ResourceRecord) {
    encode_name(buf, compressor, &rr.name);
    let rr_type = if rr.rr_type == 0 && matches!(rr.rdata, Rdata::Raw(_)) {
        rtype::ANY
    } else {
        rr.rr_type
    };
    buf.extend_from_slice(&rr_type.to_be_bytes());
    buf.extend_from_slice(&rr.class.to_be_bytes());
    buf.extend_from_slice(&rr.ttl.to_be_bytes());

    let rdlength_at = buf.len();
    buf.extend_from_slice(&0u16.to_be_bytes());
    let rdata_start = buf.len();
    encode_rdata(buf, compressor, &rr.rdata);
    let rdlength = (buf.len() - rdata_start) as u16;
    buf[rdlength_at..rdlength_at + 2].copy_from_slice(&rdlength.to_be_bytes());
}

/// Serialises `message` to wire bytes, rejecting anything that would
/// exceed `frame_size` (the host's configured datagram budget, §4.6).
pub fn encode(message: &Message, frame_size: usize) -> Result<Vec<u8>, ParseError> {
    let mut header = message.header;
    header.qdcount = message.questions.len() as u16;
    header.ancount = message.answers.len() as u16;
    header.nscount = message.authority.len() as u16;
    header.arcount = message.additional.len() as u16;

    let mut buf = header
        .pack()
        .map_err(|_| ParseError::FrameTooLarge)?
        .to_vec();
    let mut compressor = NameCompressor::new();

    for q in &message.questions {
        encode_question(&mut buf, &mut compressor, q);
    }
    for rr in &message.answers {
        encode_rr(&mut buf, &mut compressor, rr);
    }
    for rr in &message.authority {
        encode_rr(&mut buf, &mut compressor, rr);
    }
    for rr in &message.additional {
        encode_rr(&mut buf, &mut compressor, rr);
    }

    if buf.len() > frame_size {
        return Err(ParseError::FrameTooLarge);
    }
    Ok(buf)
}
