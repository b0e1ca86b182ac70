//! Command handlers for CLI operations
//!
//! This module contains handlers for different CLI commands,
//! separating command execution logic from parsing and validation.

pub mod check;
pub mod ping;
pub mod print_config;

pub use check::CheckCommandHandler;
pub use ping::PingCommandHandler;
pub use print_config::PrintConfigCommandHandler;
