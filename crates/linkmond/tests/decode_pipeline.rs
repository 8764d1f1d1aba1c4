//! Integration tests for the decode pipeline
//!
//! Covers framing, attribute decoding and link extraction over complete
//! datagrams, as the monitor would see them from the kernel.

mod common;

use common::{LinkPayload, nlmsg};
use linkmond::link::{IFF_RUNNING, IFF_UP, IFLA_IFNAME, IFLA_MAX, RTM_DELLINK, RTM_NEWLINK};
use linkmond::{
    AdminState, AttributeTable, LinkMessageKind, MonitorStats, Report, RunState,
    extract_link_event, frame_messages, process_datagram,
};
use pretty_assertions::assert_eq;

#[test]
fn test_framer_yields_every_link_message_in_order() {
    let payloads: Vec<Vec<u8>> = (1..=5)
        .map(|i| LinkPayload::new(i, 0).name(&format!("veth{}", i)).build())
        .collect();
    let datagram: Vec<u8> = payloads
        .iter()
        .enumerate()
        .flat_map(|(seq, p)| nlmsg(RTM_NEWLINK, seq as u32, p))
        .collect();

    let messages: Vec<_> = frame_messages(&datagram)
        .collect::<Result<_, _>>()
        .expect("well-formed datagram");

    assert_eq!(messages.len(), payloads.len());
    for (seq, (msg, payload)) in messages.iter().zip(&payloads).enumerate() {
        assert_eq!(msg.sequence, seq as u32);
        assert_eq!(msg.payload, payload.as_slice());
    }
}

#[test]
fn test_framer_stops_at_overlong_message() {
    let mut datagram = nlmsg(RTM_NEWLINK, 1, &LinkPayload::new(1, 0).build());
    datagram.extend(nlmsg(RTM_NEWLINK, 2, &LinkPayload::new(2, 0).build()));
    let mut overlong = nlmsg(RTM_NEWLINK, 3, &LinkPayload::new(3, 0).build());
    overlong[0..4].copy_from_slice(&1000u32.to_ne_bytes());
    datagram.extend(overlong);

    let results: Vec<_> = frame_messages(&datagram).collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    let err = results[2].unwrap_err();
    assert_eq!(err.declared_len, 1000);
    assert_eq!(err.offset, 64);
}

#[test]
fn test_repeated_attribute_latest_wins() {
    let payload = LinkPayload::new(1, 0).name("old0").name("new0").build();
    let datagram = nlmsg(RTM_NEWLINK, 0, &payload);
    let msg = frame_messages(&datagram).next().unwrap().unwrap();

    let table = AttributeTable::parse(&msg.payload[16..], IFLA_MAX);
    assert_eq!(table.get(IFLA_IFNAME).unwrap().as_str(), "new0");

    let event = extract_link_event(&msg).unwrap();
    assert_eq!(event.name.as_deref(), Some("new0"));
}

#[test]
fn test_reference_link_event() {
    let payload = LinkPayload::new(2, IFF_UP | IFF_RUNNING)
        .name("eth0")
        .carrier(1)
        .operstate(6)
        .build();
    let datagram = nlmsg(RTM_NEWLINK, 0, &payload);
    let msg = frame_messages(&datagram).next().unwrap().unwrap();

    let event = extract_link_event(&msg).unwrap();
    assert_eq!(event.kind, LinkMessageKind::New);
    assert_eq!(event.index, 2);
    assert_eq!(event.name.as_deref(), Some("eth0"));
    assert_eq!(event.carrier, Some(1));
    assert_eq!(event.operstate, Some(6));
    assert_eq!(event.admin_state, AdminState::Up);
    assert_eq!(event.run_state, RunState::Running);
}

#[test]
fn test_empty_attribute_range() {
    let datagram = nlmsg(RTM_DELLINK, 0, &LinkPayload::new(9, 0).build());
    let msg = frame_messages(&datagram).next().unwrap().unwrap();

    assert!(AttributeTable::parse(&msg.payload[16..], IFLA_MAX).is_empty());

    let event = extract_link_event(&msg).unwrap();
    assert_eq!(event.name, None);
    assert_eq!(event.carrier, None);
    assert_eq!(event.operstate, None);
}

#[test]
fn test_pipeline_output_lines() {
    let mut datagram = nlmsg(
        RTM_NEWLINK,
        1,
        &LinkPayload::new(2, IFF_UP | IFF_RUNNING)
            .name("eth0")
            .carrier(1)
            .operstate(6)
            .build(),
    );
    // RTM_NEWADDR
    datagram.extend(nlmsg(20, 2, &[0u8; 8]));
    datagram.extend(nlmsg(
        RTM_DELLINK,
        3,
        &LinkPayload::new(5, 0).name("tap0").carrier(0).build(),
    ));

    let mut sink: Vec<String> = Vec::new();
    let mut stats = MonitorStats::default();
    let framed = process_datagram(&datagram, &mut sink, &mut stats);

    assert_eq!(framed, 3);
    assert_eq!(
        sink,
        vec![
            "Network interface eth0, index: 2, carrier: 1, operstate: UP, state: UP, run state: RUNNING",
            "Unhandled message type: 20",
            "IFLA_OPERSTATE attr not present",
            "Network interface tap0, index: 5, carrier: 0, operstate: (none), state: DOWN, run state: NOT RUNNING",
        ]
    );
    assert_eq!(stats.link_events, 2);
    assert_eq!(stats.unhandled, 1);
}

#[test]
fn test_pipeline_stops_after_framing_error() {
    let loopback = LinkPayload::new(1, IFF_UP)
        .name("lo")
        .carrier(1)
        .operstate(0)
        .build();
    let mut datagram = nlmsg(RTM_NEWLINK, 1, &loopback);
    let mut bad = nlmsg(RTM_NEWLINK, 2, &[0u8; 16]);
    bad[0..4].copy_from_slice(&8u32.to_ne_bytes());
    datagram.extend(bad);
    datagram.extend(nlmsg(20, 3, &[]));

    let mut sink: Vec<String> = Vec::new();
    let mut stats = MonitorStats::default();
    assert_eq!(process_datagram(&datagram, &mut sink, &mut stats), 1);
    assert_eq!(
        sink,
        vec![
            "Network interface lo, index: 1, carrier: 1, operstate: UNKNOWN, state: UP, run state: NOT RUNNING",
            "Invalid message length: 8",
        ]
    );
    assert_eq!(stats.framing_errors, 1);
    assert_eq!(stats.unhandled, 0);
}

#[test]
fn test_short_link_message_is_reported_invalid() {
    let datagram = nlmsg(RTM_NEWLINK, 0, &[0u8; 4]);
    let msg = frame_messages(&datagram).next().unwrap().unwrap();
    assert_eq!(
        Report::from_message(&msg),
        Report::InvalidLength { declared_len: 20 }
    );
}

#[test]
fn test_non_link_message_yields_no_event() {
    let datagram = nlmsg(24, 0, &LinkPayload::new(1, IFF_UP).name("eth1").build());
    let msg = frame_messages(&datagram).next().unwrap().unwrap();
    assert_eq!(
        Report::from_message(&msg),
        Report::Unhandled { message_type: 24 }
    );
}
