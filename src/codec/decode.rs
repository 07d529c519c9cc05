//! Strictly bounds-checked RFC 1035 decoder. Every read advances an
//! explicit cursor and fails with [`ParseError::Truncated`] rather than
//! indexing out of bounds, so `parse` is total over any input slice.

use crate::domain::DomainName;
use crate::error::ParseError;
use crate::header::Header;
use crate::message::Message;
use crate::rdata::{rtype, Question, Rdata, ResourceRecord};
use packed_struct::PackedStruct;

/// Decodes a domain name starting at `start`, following compression
/// pointers. Returns the name and the cursor position immediately after
/// the name *as written at `start`* (i.e. not advanced past a followed
/// pointer's target, per §4.1).
///
/// A name may carry more than one pointer hop (e.g. a literal label
/// followed by a pointer into the middle of an earlier name that itself
/// ends in a pointer); each hop's target must be strictly less than the
/// previous hop's target, which both matches a real DNS name's layout and
/// bounds the loop to at most `data.len()` iterations.
fn decode_name(data: &[u8], start: usize) -> Result<(DomainName, usize), ParseError> {
    let mut name = DomainName::root();
    let mut cur = start;
    let mut outer_end: Option<usize> = None;
    let mut last_jump_target: Option<usize> = None;

    loop {
        if cur >= data.len() {
            return Err(ParseError::Truncated);
        }
        let b = data[cur];
        match b >> 6 {
            0b00 => {
                let len = (b & 0x3f) as usize;
                if len == 0 {
                    if outer_end.is_none() {
                        outer_end = Some(cur + 1);
                    }
                    break;
                }
                if cur + 1 + len > data.len() {
                    return Err(ParseError::Truncated);
                }
                name.push_label(data[cur + 1..cur + 1 + len].to_vec())?;
                cur += 1 + len;
            }
            0b11 => {
                if cur + 2 > data.len() {
                    return Err(ParseError::Truncated);
                }
                let ptr = (((b & 0x3f) as usize) << 8) | data[cur + 1] as usize;
                match last_jump_target {
                    Some(last) if ptr >= last => return Err(ParseError::PointerLoop),
                    None if ptr >= cur => return Err(ParseError::PointerForward),
                    _ => {}
                }
                if outer_end.is_none() {
                    outer_end = Some(cur + 2);
                }
                last_jump_target = Some(ptr);
                cur = ptr;
            }
            _ => return Err(ParseError::MalformedName),
        }
    }

    Ok((name, outer_end.expect("set before breaking out of the loop")))
}

fn read_u16(data: &[u8], at: usize) -> Result<u16, ParseError> {
    if at + 2 > data.len() {
        return Err(ParseError::Truncated);
    }
    Ok(u16::from_be_bytes([data[at], data[at + 1]]))
}

fn read_u32(data: &[u8], at: usize) -> Result<u32, ParseError> {
    if at + 4 > data.len() {
        return Err(ParseError::Truncated);
    }
    Ok(u32::from_be_bytes([
        data[at],
        data[at + 1],
        data[at + 2],
        data[at + 3],
    ]))
}

fn decode_question(data: &[u8], cur: usize) -> Result<(Question, usize), ParseError> {
    let (name, mut cur) = decode_name(data, cur)?;
    let qtype = read_u16(data, cur)?;
    cur += 2;
    let qclass = read_u16(data, cur)?;
    cur += 2;
    Ok((
        Question {
            name,
            qtype,
            qclass,
        },
        cur,
    ))
}

fn decode_rdata(data: &[u8], rr_type: u16, start: usize, end: usize) -> Result<Rdata, ParseError> {
    let slice = &data[start..end];
    let rdata = match rr_type {
        rtype::A if slice.len() == 4 => {
            Rdata::A(std::net::Ipv4Addr::new(slice[0], slice[1], slice[2], slice[3]))
        }
        rtype::NS => Rdata::Ns(decode_name(data, start)?.0),
        rtype::CNAME => Rdata::Cname(decode_name(data, start)?.0),
        rtype::PTR => Rdata::Ptr(decode_name(data, start)?.0),
        rtype::SRV if slice.len() >= 6 => {
            let priority = read_u16(data, start)?;
            let weight = read_u16(data, start + 2)?;
            let port = read_u16(data, start + 4)?;
            let (target, _) = decode_name(data, start + 6)?;
            Rdata::Srv {
                priority,
                weight,
                port,
                target,
            }
        }
        rtype::TXT => Rdata::Txt(slice.to_vec()),
        _ => Rdata::Raw(slice.to_vec()),
    };
    Ok(rdata)
}

fn decode_rr(data: &[u8], cur: usize) -> Result<(ResourceRecord, usize), ParseError> {
    let (name, mut cur) = decode_name(data, cur)?;
    let rr_type = read_u16(data, cur)?;
    cur += 2;
    let class = read_u16(data, cur)?;
    cur += 2;
    let ttl = read_u32(data, cur)?;
    cur += 4;
    let rdlength = read_u16(data, cur)? as usize;
    cur += 2;
    if cur + rdlength > data.len() {
        return Err(ParseError::Truncated);
    }
    let rdata = decode_rdata(data, rr_type, cur, cur + rdlength)?;
    cur += rdlength;
    Ok((
        ResourceRecord {
            name,
            rr_type,
            class,
            ttl,
            rdata,
        },
        cur,
    ))
}

/// Parses a complete UDP payload into a [`Message`]. Never panics, and
/// always returns in time bounded by `packet.len()` (§8, fuzz target).
pub fn parse(packet: &[u8]) -> Result<Message, ParseError> {
    if packet.len() < 12 {
        return Err(ParseError::Truncated);
    }
    let mut header_bytes = [0u8; 12];
    header_bytes.copy_from_slice(&packet[0..12]);
    let header = Header::unpack(&header_bytes).map_err(|_| ParseError::MalformedName)?;

    let mut cur = 12;
    let mut questions = Vec::new();
    for _ in 0..header.qdcount {
        let (q, next) = decode_question(packet, cur)?;
        questions.push(q);
        cur = next;
    }

    let mut answers = Vec::new();
    for _ in 0..header.ancount {
        let (rr, next) = decode_rr(packet, cur)?;
        answers.push(rr);
        cur = next;
    }

    let mut authority = Vec::new();
    for _ in 0..header.nscount {
        let (rr, next) = decode_rr(packet, cur)?;
        authority.push(rr);
        cur = next;
    }

    let mut additional = Vec::new();
    for _ in 0..header.arcount {
        let (rr, next) = decode_rr(packet, cur)?;
        additional.push(rr);
        cur = next;
    }

    Ok(Message {
        header,
        questions,
        answers,
        authority,
        additional,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_header_is_rejected() {
        let packet = [0u8; 4];
        assert_eq!(parse(&packet), Err(ParseError::Truncated));
    }

    #[test]
    fn name_with_no_labels_is_root() {
        // header claims 1 question, name is just a root label
        let mut packet = vec![0u8; 12];
        packet[5] = 1; // qdcount
        packet.push(0); // root name
        packet.extend_from_slice(&1u16.to_be_bytes()); // qtype A
        packet.extend_from_slice(&1u16.to_be_bytes()); // qclass IN
        let msg = parse(&packet).unwrap();
        assert_eq!(msg.questions.len(), 1);
        assert_eq!(msg.questions[0].name, DomainName::root());
    }

    #[test]
    fn rejects_reserved_label_type_bits() {
        // Top two bits 0b01 are reserved by RFC 1035 and never a literal
        // label length nor a compression pointer.
        let mut packet = vec![0u8; 12];
        packet[5] = 1;
        packet.push(0x41);
        let err = parse(&packet).unwrap_err();
        assert_eq!(err, ParseError::MalformedName);
    }
}
