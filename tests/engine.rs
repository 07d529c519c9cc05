//! End-to-end exercises of the six concrete scenarios against the public
//! `Engine` facade, rather than against individual components.

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use opcua_mdns::domain::DomainName;
use opcua_mdns::engine::{Engine, DEFAULT_FRAME_SIZE};
use opcua_mdns::query::CallbackAction;
use opcua_mdns::rdata::{rtype, CLASS_IN};

const MULTICAST_PORT: u16 = opcua_mdns::scheduler::MULTICAST_PORT;
const MULTICAST_ADDR: Ipv4Addr = opcua_mdns::scheduler::MULTICAST_ADDR;

#[test]
fn decoder_rejects_pointer_loop() {
    let mut engine = Engine::new(DEFAULT_FRAME_SIZE);
    let now = Instant::now();
    let mut packet = vec![0u8; 14];
    packet[5] = 1; // qdcount = 1
    packet[12] = 0xC0;
    packet[13] = 0x0C; // pointer to offset 12, itself
    let result = engine.feed(&packet, Ipv4Addr::new(192, 168, 1, 1), MULTICAST_PORT, now);
    assert!(result.is_err());
}

#[test]
fn name_compression_saves_bytes_on_ptr_answer() {
    let mut engine = Engine::new(DEFAULT_FRAME_SIZE);
    let now = Instant::now();
    let service = DomainName::from_str("_opcua-tcp._tcp.local").unwrap();
    let instance = DomainName::from_str("myhost-a._opcua-tcp._tcp.local").unwrap();

    let handle = engine
        .publish_shared(service.clone(), rtype::PTR, 120, now)
        .unwrap();
    engine.set_rdata_name(handle, instance).unwrap();

    let outgoing = engine.drain(now).expect("expected an announce packet");
    assert_eq!(outgoing.dst_addr, MULTICAST_ADDR);
    let decoded = opcua_mdns::codec::parse(&outgoing.packet).unwrap();
    assert_eq!(decoded.answers.len(), 1);
    assert_eq!(decoded.answers[0].rdata, opcua_mdns::rdata::Rdata::Ptr(
        DomainName::from_str("myhost-a._opcua-tcp._tcp.local").unwrap()
    ));

    // The owner name is spelled out literally (its first occurrence); the
    // rdata's shared `_opcua-tcp._tcp.local` suffix collapses to a 2-byte
    // pointer, so the rdata is just "myhost-a" plus that pointer.
    let header_and_owner_and_fixed_fields = 12 + service.encoded_len() + 10;
    let expected_rdata_len = 1 + "myhost-a".len() + 2;
    assert_eq!(
        outgoing.packet.len(),
        header_and_owner_and_fixed_fields + expected_rdata_len
    );
}

#[test]
fn probe_then_announce_across_four_ticks() {
    let mut engine = Engine::new(DEFAULT_FRAME_SIZE);
    let t0 = Instant::now();
    let name = DomainName::from_str("x._svc._tcp.local").unwrap();
    let handle = engine
        .publish_unique(name.clone(), rtype::SRV, 120, Box::new(|| {}), t0)
        .unwrap();
    engine
        .set_rdata_srv(handle, 0, 0, 4840, name.clone())
        .unwrap();

    for tick in 0..4u32 {
        let now = t0 + Duration::from_millis(250 * tick as u64);
        let outgoing = engine.drain(now).expect("expected a probe packet");
        let decoded = opcua_mdns::codec::parse(&outgoing.packet).unwrap();
        assert!(decoded.is_query());
        assert_eq!(decoded.questions.len(), 1);
        assert_eq!(decoded.questions[0].name, name);
        assert_eq!(decoded.authority.len(), 1);
    }

    let now = t0 + Duration::from_millis(1000);
    let outgoing = engine.drain(now).expect("expected the announce packet");
    let decoded = opcua_mdns::codec::parse(&outgoing.packet).unwrap();
    assert!(decoded.is_answer());
    assert_eq!(decoded.answers.len(), 1);
}

#[test]
fn conflict_during_probe_drops_the_record() {
    let mut engine = Engine::new(DEFAULT_FRAME_SIZE);
    let t0 = Instant::now();
    let name = DomainName::from_str("x._svc._tcp.local").unwrap();
    let notified = std::rc::Rc::new(std::cell::RefCell::new(0));
    let notified2 = notified.clone();
    let handle = engine
        .publish_unique(
            name.clone(),
            rtype::SRV,
            120,
            Box::new(move || *notified2.borrow_mut() += 1),
            t0,
        )
        .unwrap();
    engine
        .set_rdata_srv(handle, 0, 0, 4840, name.clone())
        .unwrap();

    // First probe tick goes out uncontested.
    assert!(engine.drain(t0).is_some());

    // A peer claims the same name with a different port in its authority.
    let conflicting = opcua_mdns::rdata::ResourceRecord::new(
        name.clone(),
        CLASS_IN,
        120,
        opcua_mdns::rdata::Rdata::Srv {
            priority: 0,
            weight: 0,
            port: 9999,
            target: name.clone(),
        },
    );
    let msg = opcua_mdns::message::Message {
        header: opcua_mdns::header::Header::default(),
        questions: vec![opcua_mdns::rdata::Question {
            name: name.clone(),
            qtype: rtype::SRV,
            qclass: CLASS_IN,
        }],
        answers: vec![],
        authority: vec![conflicting],
        additional: vec![],
    };
    let packet = opcua_mdns::codec::encode(&msg, DEFAULT_FRAME_SIZE).unwrap();
    let now = t0 + Duration::from_millis(300);
    engine
        .feed(&packet, Ipv4Addr::new(192, 168, 1, 9), MULTICAST_PORT, now)
        .unwrap();

    assert_eq!(*notified.borrow(), 1);

    // No further probe or announce packets for this record: the scheduler
    // may still have nothing to say, which is the expected outcome.
    let later = t0 + Duration::from_secs(5);
    assert!(engine.drain(later).is_none());
}

#[test]
fn known_answer_suppression_blocks_the_response() {
    let mut engine = Engine::new(DEFAULT_FRAME_SIZE);
    let t0 = Instant::now();
    let name = DomainName::from_str("foo.local").unwrap();
    let target = DomainName::from_str("bar.local").unwrap();
    let handle = engine
        .publish_shared(name.clone(), rtype::PTR, 120, t0)
        .unwrap();
    engine.set_rdata_name(handle, target.clone()).unwrap();

    // Let the initial announcement drain so the record is at rest.
    while engine.drain(t0).is_some() {}

    let already_known = opcua_mdns::rdata::ResourceRecord::new(
        name.clone(),
        CLASS_IN,
        120,
        opcua_mdns::rdata::Rdata::Ptr(target),
    );
    let msg = opcua_mdns::message::Message {
        header: opcua_mdns::header::Header::default(),
        questions: vec![opcua_mdns::rdata::Question {
            name: name.clone(),
            qtype: rtype::PTR,
            qclass: CLASS_IN,
        }],
        answers: vec![already_known],
        authority: vec![],
        additional: vec![],
    };
    let packet = opcua_mdns::codec::encode(&msg, DEFAULT_FRAME_SIZE).unwrap();
    let now = t0 + Duration::from_millis(10);
    engine
        .feed(&packet, MULTICAST_ADDR, MULTICAST_PORT, now)
        .unwrap();

    assert!(engine.drain(now + Duration::from_millis(1)).is_none());
}

#[test]
fn cache_expiry_notifies_a_registered_query_with_goodbye() {
    let mut engine = Engine::new(DEFAULT_FRAME_SIZE);
    let t0 = Instant::now();
    let name = DomainName::from_str("foo.local").unwrap();

    let notified_ttl = std::rc::Rc::new(std::cell::RefCell::new(None));
    let notified_ttl2 = notified_ttl.clone();
    engine.query(
        name.clone(),
        rtype::A,
        Some(Box::new(move |rr| {
            *notified_ttl2.borrow_mut() = Some(rr.ttl);
            CallbackAction::Keep
        })),
        t0,
    );

    let answer = opcua_mdns::rdata::ResourceRecord::new(
        name.clone(),
        CLASS_IN,
        10,
        opcua_mdns::rdata::Rdata::A(Ipv4Addr::new(10, 0, 0, 1)),
    );
    let msg = opcua_mdns::message::Message {
        header: opcua_mdns::header::Header::default().as_answer(),
        questions: vec![],
        answers: vec![answer],
        authority: vec![],
        additional: vec![],
    };
    let packet = opcua_mdns::codec::encode(&msg, DEFAULT_FRAME_SIZE).unwrap();
    engine
        .feed(&packet, Ipv4Addr::new(192, 168, 1, 1), MULTICAST_PORT, t0)
        .unwrap();

    let later = t0 + Duration::from_secs(14);
    engine.drain(later);
    assert_eq!(*notified_ttl.borrow(), Some(0));
}
