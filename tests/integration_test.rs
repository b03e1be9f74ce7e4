// Integration tests for the endpoint state model
//
// These drive connections through local calls and inbound peer frames the
// way a reactor would

mod common;

use std::collections::BTreeMap;
use amqp_endpoint::{
    names, AmqpValue, Condition, Connection, Container, ConnectionOptions, Data, Endpoint,
    EndpointState, Error, Frame, LinkOptions, Ratio, RemoteOpen, Role, Transport,
};
use common::{data_of, init_logger, open_connection, peer_attach, peer_open};

#[test]
fn test_full_lifecycle() {
    init_logger();
    let mut conn = open_connection("client");
    let session = conn.open_session().unwrap();
    let sender = conn.open_sender(session, LinkOptions::new().target("queue.a")).unwrap();
    let sender_name = conn.link(sender).unwrap().name().to_string();

    conn.process_all([
        peer_open("broker", &["ANONYMOUS-RELAY"]),
        Frame::Begin { channel: 3, remote_channel: Some(0) },
        peer_attach(3, 0, &sender_name, Role::Receiver),
    ])
    .unwrap();

    let both_active = EndpointState::LOCAL_ACTIVE | EndpointState::REMOTE_ACTIVE;
    assert_eq!(conn.state(), both_active);
    assert_eq!(conn.session(session).unwrap().state(), both_active);
    assert_eq!(conn.link(sender).unwrap().state(), both_active);

    // Local teardown, then the peer answers
    conn.link_mut(sender).unwrap().close(None);
    conn.session_mut(session).unwrap().close(None);
    conn.close(None);
    conn.process_all([
        Frame::Detach { channel: 3, handle: 0, error: None },
        Frame::End { channel: 3, error: None },
        Frame::Close { error: None },
    ])
    .unwrap();

    let both_closed = EndpointState::LOCAL_CLOSED | EndpointState::REMOTE_CLOSED;
    assert_eq!(conn.state(), both_closed);
    assert_eq!(conn.each_link(both_closed).count(), 1);

    conn.free_session(session).unwrap();
    assert_eq!(conn.each_session(EndpointState::ANY).count(), 0);
    assert!(matches!(conn.link(sender), Err(Error::UnknownEndpoint(_))));
}

#[test]
fn test_remote_capabilities_decoded_on_read() {
    init_logger();
    let mut conn = open_connection("client");
    assert_eq!(conn.remote_offered_capabilities().unwrap(), None);

    let mut props = BTreeMap::new();
    props.insert("product".to_string(), AmqpValue::from("broker"));
    props.insert("version".to_string(), AmqpValue::Uint(2));

    let mut open = RemoteOpen::new("broker");
    open.hostname = Some("vhost-a".to_string());
    open.offered_capabilities = data_of(AmqpValue::symbol("ANONYMOUS-RELAY"));
    open.desired_capabilities = data_of(AmqpValue::List(vec![
        AmqpValue::symbol("SHARED-SUBS"),
        AmqpValue::symbol("DELAYED_DELIVERY"),
    ]));
    open.properties = data_of(AmqpValue::Map(props.clone()));
    conn.process(Frame::Open(open)).unwrap();

    assert_eq!(conn.remote_container_id(), Some("broker"));
    assert_eq!(conn.remote_hostname(), Some("vhost-a"));
    assert_eq!(
        conn.remote_offered_capabilities().unwrap(),
        Some(vec!["ANONYMOUS-RELAY".to_string()])
    );
    assert_eq!(
        conn.remote_desired_capabilities().unwrap(),
        Some(vec!["SHARED-SUBS".to_string(), "DELAYED_DELIVERY".to_string()])
    );
    assert_eq!(conn.remote_properties().unwrap(), Some(props));
}

#[test]
fn test_malformed_remote_properties_surface_to_reader() {
    init_logger();
    let mut conn = open_connection("client");
    let mut open = RemoteOpen::new("broker");
    // map8 header claiming more bytes than follow
    open.properties = Data::from_bytes(vec![0xc1, 0x10, 0x02]);
    open.offered_capabilities = data_of(AmqpValue::Array(vec![AmqpValue::Uint(1)]));

    // Frame processing itself succeeds; decoding is deferred
    conn.process(Frame::Open(open)).unwrap();
    assert!(conn.state().is_remote_active());

    assert!(matches!(conn.remote_properties(), Err(Error::Decode(_))));
    assert!(matches!(conn.remote_offered_capabilities(), Err(Error::Decode(_))));
    assert_eq!(conn.remote_desired_capabilities().unwrap(), None);
}

#[test]
fn test_hostile_remote_data_is_a_decode_error() {
    init_logger();
    let mut conn = open_connection("client");
    let mut open = RemoteOpen::new("broker");
    // array32 of nulls claiming u32::MAX elements in ten bytes
    open.offered_capabilities = Data::from_bytes(vec![0xf0, 0, 0, 0, 5, 0xff, 0xff, 0xff, 0xff, 0x40]);
    // list32 headers nested far deeper than any real OPEN
    let mut nested = Vec::new();
    for level in (0..100_000usize).rev() {
        nested.push(0xd0);
        nested.extend_from_slice(&((level * 9 + 5) as u32).to_be_bytes());
        nested.extend_from_slice(&1u32.to_be_bytes());
    }
    nested.push(0x40);
    open.properties = Data::from_bytes(nested);
    conn.process(Frame::Open(open)).unwrap();

    assert!(matches!(conn.remote_offered_capabilities(), Err(Error::Decode(_))));
    assert!(matches!(conn.remote_properties(), Err(Error::Decode(_))));
}

#[test]
fn test_idle_timeout_from_peer_open() {
    init_logger();
    let mut conn = open_connection("client");
    conn.bind(Transport::new()).unwrap();

    let mut open = RemoteOpen::new("broker");
    open.idle_timeout = Some(2500);
    conn.process(Frame::Open(open)).unwrap();

    assert_eq!(conn.idle_timeout(), Some(Ratio::new(5, 2)));
    assert_eq!(conn.transport().and_then(Transport::remote_idle_timeout), Some(2500));

    conn.unbind();
    assert_eq!(conn.idle_timeout(), None);
}

#[test]
fn test_idle_timeout_absent_without_transport() {
    init_logger();
    let mut conn = open_connection("client");
    let mut open = RemoteOpen::new("broker");
    open.idle_timeout = Some(60_000);
    conn.process(Frame::Open(open)).unwrap();
    assert_eq!(conn.idle_timeout(), None);
}

#[test]
fn test_peer_error_is_a_condition_not_an_error() {
    init_logger();
    let mut conn = open_connection("client");
    let session = conn.default_session().unwrap();
    let receiver = conn.open_receiver(session, LinkOptions::new().source("missing")).unwrap();
    let name = conn.link(receiver).unwrap().name().to_string();

    conn.process_all([
        peer_open("broker", &[]),
        Frame::Begin { channel: 0, remote_channel: Some(0) },
        peer_attach(0, 7, &name, Role::Sender),
        Frame::Detach {
            channel: 0,
            handle: 7,
            error: Some(Condition::new(names::NOT_FOUND, "no node named 'missing'")),
        },
    ])
    .unwrap();

    let link = conn.link(receiver).unwrap();
    assert!(link.state().is_local_active());
    assert!(link.state().is_remote_closed());
    assert_eq!(link.remote_condition().map(Condition::name), Some(names::NOT_FOUND));
    assert_eq!(link.local_condition(), None);
}

#[test]
fn test_container_connections() {
    init_logger();
    let container = Container::with_id("worker-7");
    let mut a = container.connection();
    let mut b = container.connection();
    a.open();
    b.open_with(ConnectionOptions::builder().container_id("override").build().unwrap())
        .unwrap();

    assert_eq!(a.container_id(), Some("worker-7"));
    assert_eq!(b.container_id(), Some("override"));
    assert_ne!(a.id(), b.id());
}

#[test]
fn test_handles_fail_after_connection_dropped() {
    init_logger();
    let mut first = Connection::new();
    let session = first.open_session().unwrap();
    drop(first);

    let second = Connection::new();
    assert!(matches!(second.session(session), Err(Error::UnknownEndpoint(_))));
}

#[test]
fn test_each_link_walks_all_sessions() {
    init_logger();
    let mut conn = open_connection("c");
    let s1 = conn.open_session().unwrap();
    let s2 = conn.open_session().unwrap();
    let a = conn.open_sender(s1, LinkOptions::new()).unwrap();
    let b = conn.open_receiver(s2, LinkOptions::new()).unwrap();
    let c = conn.open_sender(s2, LinkOptions::new()).unwrap();

    let order: Vec<_> = conn.each_link(EndpointState::ANY).map(|l| l.id()).collect();
    assert_eq!(order, vec![a, b, c]);

    let s2_links: Vec<_> = conn
        .session_links(s2, EndpointState::LOCAL_ACTIVE)
        .unwrap()
        .map(|l| l.name().to_string())
        .collect();
    assert_eq!(s2_links, vec!["c/1".to_string(), "c/2".to_string()]);
}
