mod buffer;
mod error;
mod id;

pub use buffer::*;
pub use error::*;
pub use id::*;
