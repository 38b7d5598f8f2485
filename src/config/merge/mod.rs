//! Merging configuration sources into a `VhdConfig`.

pub mod merge_policy;
pub mod service;
