//! Virtual filesystem
//!
//! A single tree rooted at `/` whose children are drives. Each drive's
//! subtree of directories and files is mirrored from its catalog on first
//! access and kept in step with it by the mutation operations.

pub mod flatten;
pub mod loader;
pub mod mutation;
pub mod node;
pub mod path;
pub mod resolver;
pub mod tree;

pub use node::{DriveData, FileData, LoadState, Node, NodeId, NodeKind};
pub use resolver::ResolveOptions;
pub use tree::VirtualTree;
