//! RFC 1035 wire-format codec: decode (§4.1 decoder contract) and encode
//! (with bounded name compression).

mod decode;
mod encode;

pub use decode::parse;
pub use encode::encode;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainName;
    use crate::header::Header;
    use crate::message::Message;
    use crate::rdata::{rtype, Rdata, ResourceRecord};

    fn sample_message() -> Message {
        let owner = DomainName::from_str("myhost-a._opcua-tcp._tcp.local").unwrap();
        let ptr_target = DomainName::from_str("_opcua-tcp._tcp.local").unwrap();
        let rr = ResourceRecord::new(ptr_target.clone(), rtype::ANY, 120, Rdata::Ptr(owner));
        let mut header = Header::default();
        header.aa = true;
        Message {
            header,
            questions: vec![],
            answers: vec![rr],
            authority: vec![],
            additional: vec![],
        }
    }

    #[test]
    fn emitted_packets_round_trip() {
        let msg = sample_message();
        let bytes = encode(&msg, 4096).unwrap();
        let decoded = parse(&bytes).unwrap();
        assert_eq!(decoded.answers.len(), 1);
        assert_eq!(decoded.answers[0].rdata, msg.answers[0].rdata);
        assert_eq!(decoded.answers[0].name, msg.answers[0].name);
    }

    #[test]
    fn rejects_self_referential_pointer() {
        // 12-byte header + a 2-byte name that is a pointer to offset 12
        // (itself).
        let mut packet = vec![0u8; 14];
        packet[4] = 0x00;
        packet[5] = 0x01; // qdcount = 1
        packet[12] = 0xC0;
        packet[13] = 0x0C;
        let err = parse(&packet).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ParseError::PointerForward | crate::error::ParseError::PointerLoop
        ));
    }

    #[test]
    fn second_record_reusing_a_compressed_owner_name_round_trips() {
        // record1's rdata is the instance name, itself compressed against
        // record1's own owner (the service type). record2's owner is that
        // same instance name, so it compresses to a single pointer into
        // record1's rdata — and decoding that owner means following a
        // literal label there, then a second, strictly-backward pointer
        // into record1's owner. Two pointer hops for one name.
        let service = DomainName::from_str("_opcua-tcp._tcp.local").unwrap();
        let instance = DomainName::from_str("myhost-a._opcua-tcp._tcp.local").unwrap();
        let record1 = ResourceRecord::new(service, rtype::PTR, 120, Rdata::Ptr(instance.clone()));
        let record2 = ResourceRecord::new(instance.clone(), rtype::TXT, 120, Rdata::Txt(vec![0]));

        let msg = Message {
            header: Header::default(),
            questions: vec![],
            answers: vec![record1, record2],
            authority: vec![],
            additional: vec![],
        };
        let bytes = encode(&msg, 4096).unwrap();
        let decoded = parse(&bytes).unwrap();
        assert_eq!(decoded.answers.len(), 2);
        assert_eq!(decoded.answers[1].name, instance);
    }

    #[test]
    fn parse_is_total_over_arbitrary_short_input() {
        for len in 0..16 {
            let packet = vec![0xffu8; len];
            // Must never panic, regardless of outcome.
            let _ = parse(&packet);
        }
    }
}
