mod error;
mod metadata;
mod properties;
mod registry;

pub use error::*;
pub use metadata::*;
pub use properties::*;
pub use registry::*;
