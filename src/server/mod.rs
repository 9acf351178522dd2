mod info;
mod jar;
mod manager;

pub use info::*;
pub use jar::*;
pub use manager::*;
