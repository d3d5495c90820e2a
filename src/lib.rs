pub use conduit_core::*;
pub use conduit_macros::*;
