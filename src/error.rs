//! Error types
//!
//! `VfsError` carries the failure kinds of path resolution and tree mutation,
//! `StorageError` the failures of catalog and blob I/O, and `ApiError` is what
//! the shell and CLI surface to the user.

use crate::types::{CatalogId, DriveId};
use std::fmt;
use thiserror::Error;

/// What a path was expected to resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    File,
    Directory,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::File => write!(f, "file"),
            Expected::Directory => write!(f, "folder"),
        }
    }
}

/// Failure category of a `VfsError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VfsErrorKind {
    PathSyntax,
    NotFound,
    TypeMismatch,
    AlreadyExists,
    InvalidOperation,
    CatalogCorrupt,
    BackingStoreFailure,
}

/// Errors from path resolution, lazy loading and structural mutation.
#[derive(Debug, Error)]
pub enum VfsError {
    #[error("{0}")]
    PathSyntax(String),

    #[error("cannot find {name} in {parent}")]
    NotFound { name: String, parent: String },

    #[error("not a {expected}: {path}")]
    TypeMismatch { path: String, expected: Expected },

    #[error("entry {name} already exists at {parent}")]
    AlreadyExists { name: String, parent: String },

    #[error("{0}")]
    InvalidOperation(String),

    #[error("corrupt catalog for drive {drive}: {reason}")]
    CatalogCorrupt { drive: String, reason: String },

    #[error(transparent)]
    BackingStore(#[from] StorageError),
}

impl VfsError {
    pub fn kind(&self) -> VfsErrorKind {
        match self {
            VfsError::PathSyntax(_) => VfsErrorKind::PathSyntax,
            VfsError::NotFound { .. } => VfsErrorKind::NotFound,
            VfsError::TypeMismatch { .. } => VfsErrorKind::TypeMismatch,
            VfsError::AlreadyExists { .. } => VfsErrorKind::AlreadyExists,
            VfsError::InvalidOperation(_) => VfsErrorKind::InvalidOperation,
            VfsError::CatalogCorrupt { .. } => VfsErrorKind::CatalogCorrupt,
            VfsError::BackingStore(_) => VfsErrorKind::BackingStoreFailure,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        VfsError::InvalidOperation(message.into())
    }
}

/// Catalog and blob storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("no {kind} record with id {id}")]
    MissingRecord { kind: &'static str, id: CatalogId },

    #[error("malformed catalog line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("unknown drive id {0}")]
    UnknownDrive(DriveId),

    #[error("wrong metadata: {0}")]
    BadMetadata(String),

    #[error("checksum mismatch for {object}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        object: String,
        expected: String,
        actual: String,
    },
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Errors surfaced by the shell and the CLI
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    Usage(String),

    /// A shell command failed; the session goes on.
    #[error("{command}: {source}")]
    Command {
        command: String,
        #[source]
        source: Box<ApiError>,
    },

    #[error(transparent)]
    Vfs(#[from] VfsError),

    #[error(transparent)]
    StorageError(#[from] StorageError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Tree error category behind this error, if any.
    pub fn vfs_kind(&self) -> Option<VfsErrorKind> {
        match self {
            ApiError::Vfs(err) => Some(err.kind()),
            ApiError::Command { source, .. } => source.vfs_kind(),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
