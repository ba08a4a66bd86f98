//! CLI commands module.

mod config;
mod decode;
mod narrate;
mod util;

pub use config::ConfigCommand;
pub use decode::DecodeCommand;
pub use narrate::NarrateCommand;

pub(crate) use util::*;
