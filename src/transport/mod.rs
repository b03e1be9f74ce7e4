mod transport;
mod frame;

pub use transport::*;
pub use frame::*;
