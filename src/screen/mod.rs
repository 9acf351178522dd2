mod multiplexer;
mod session;
#[cfg(test)]
mod fake;

pub use multiplexer::*;
pub use session::*;
#[cfg(test)]
pub use fake::{Call, FakeMultiplexer};
