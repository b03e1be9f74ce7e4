mod connection;
mod config;
mod container;
mod inbound;
mod iter;

pub use connection::*;
pub use config::*;
pub use container::*;
pub use iter::*;
