//! Integration tests for the virtual hard drive

mod catalog_roundtrip;
mod mutation_scenarios;
mod resolver_scenarios;
mod shell_commands;
mod support;
