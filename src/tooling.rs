//! Tooling & Integration Layer
//!
//! Command-line front end over the shell.

pub mod cli;

pub use cli::{Cli, CliContext};
