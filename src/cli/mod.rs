//! CLI module for ambience.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `display`: Output formatting and display logic
//! - `repl`: Line commands of an interactive session
//! - `runner`: Wiring and event loop of an interactive session

pub mod commands;
pub mod display;
pub mod repl;
pub mod runner;

pub use commands::{Cli, Commands, MixesCommand, PlayArgs};
pub use display::Display;
pub use repl::{Flow, ReplCommand, ReplError};
pub use runner::{build_catalog, build_services, run_interactive};
