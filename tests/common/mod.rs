// Common test utilities and helper functions
//
// Builders for peer frames and pre-opened connections shared by the
// integration tests

#![allow(dead_code)]

use amqp_endpoint::{
    AmqpValue, Connection, ConnectionOptions, Data, Frame, RemoteOpen, Role,
};

/// Install the test logger once; repeated calls are harmless
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Connection opened locally with a fixed container id
pub fn open_connection(container_id: &str) -> Connection {
    let options = ConnectionOptions::builder()
        .container_id(container_id)
        .build()
        .expect("Failed to build connection options");
    let mut conn = Connection::new();
    conn.open_with(options).expect("Failed to open connection");
    conn
}

/// Encode a value into a typed-data slot
pub fn data_of(value: AmqpValue) -> Data {
    let mut data = Data::new();
    data.put(&value).expect("Failed to encode test value");
    data
}

/// Peer OPEN advertising the given capabilities
pub fn peer_open(container_id: &str, offered: &[&str]) -> Frame {
    let mut open = RemoteOpen::new(container_id);
    open.offered_capabilities = data_of(AmqpValue::Array(
        offered.iter().map(|c| AmqpValue::symbol(*c)).collect(),
    ));
    Frame::Open(open)
}

/// Peer ATTACH for a link called `name`
pub fn peer_attach(channel: u16, handle: u32, name: &str, peer_role: Role) -> Frame {
    Frame::Attach {
        channel,
        handle,
        name: name.to_string(),
        role: peer_role,
        source: None,
        target: None,
    }
}
