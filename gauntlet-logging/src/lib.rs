//! Logging initialisation for gauntlet
//!
//! Every crate logs through `tracing`; binaries call one of the init
//! functions here once at startup.

pub mod init;

pub use gauntlet_config::{LogFormat, LogLevel, LoggingConfig};
pub use init::{env_filter, init_logging_from_config, init_simple_tracing};
