mod select;
#[cfg(test)]
mod fake;

pub use select::*;
#[cfg(test)]
pub use fake::ScriptedPrompt;
