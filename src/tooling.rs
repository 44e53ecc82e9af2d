//! Tooling
//!
//! Command-line access to tree files.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
