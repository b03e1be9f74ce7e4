mod value;
mod encoder;
mod decoder;
mod data;

pub use value::*;
pub use encoder::*;
pub use decoder::*;
pub use data::*;
