mod utils;
mod codec;
mod endpoint;
mod session;
mod link;
mod transport;
mod connection;

// Re-export commonly used types at crate root
pub use utils::*;
pub use codec::*;
pub use endpoint::*;
pub use session::*;
pub use link::*;
pub use transport::*;
pub use connection::*;

// Exact-seconds type returned by Connection::idle_timeout
pub use num_rational::Ratio;
