//! VHD: Virtual Hard Drive
//!
//! Files kept in remote object storage, presented as one virtual filesystem.
//! Drives map to storage backends; their directory structure lives in a
//! catalog and is loaded into an in-memory tree on first access.

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod shell;
pub mod storage;
pub mod tooling;
pub mod types;
pub mod vfs;
