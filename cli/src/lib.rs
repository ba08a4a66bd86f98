//! CLI utilities for shtepy.
//!
//! Context-based configuration, request file loading, and output helpers
//! shared by the command-line tools.

pub mod config;
pub mod output;
pub mod request;

pub use config::{Config, Context, load_config, mask_api_key};
pub use output::{Output, OutputFormat, print_verbose};
pub use request::{RequestError, load_request, parse_request};
