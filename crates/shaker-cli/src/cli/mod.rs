pub mod bridge;
pub mod commands;
pub mod config;
pub mod setup;

pub use bridge::Bridge;
pub use commands::{BridgeCommand, CommandError};
pub use config::CliConfig;
