mod state;
mod condition;
mod lifecycle;
mod handle;

pub use state::*;
pub use condition::*;
pub use lifecycle::*;
pub use handle::*;
