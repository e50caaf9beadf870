//! Error taxonomy for the wallet boundary.
//!
//! Every fallible operation reports through this closed set. Failures are
//! classified where they occur and carried across the boundary inside a
//! result envelope; nothing panics past the call surface.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed classification of boundary failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or incompatible descriptor string.
    InvalidDescriptor,
    /// Backend unreachable, protocol error, or timeout during sync.
    Network,
    /// Wallet store open/read/write failure.
    Persistence,
    /// Empty required input, or a stale/released handle.
    InvalidArgument,
    /// Unclassified backend failure.
    Unknown,
}

/// Wallet boundary errors
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid descriptor: {0}")]
    Descriptor(String),

    #[error("network or sync failure: {0}")]
    Network(String),

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown failure: {0}")]
    Unknown(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Descriptor(_) => ErrorKind::InvalidDescriptor,
            Error::Network(_) => ErrorKind::Network,
            Error::Persistence(_) => ErrorKind::Persistence,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::Unknown(_) => ErrorKind::Unknown,
        }
    }

    pub(crate) fn descriptor(source: impl std::fmt::Display) -> Self {
        Error::Descriptor(source.to_string())
    }

    pub(crate) fn network(source: impl std::fmt::Display) -> Self {
        Error::Network(source.to_string())
    }

    pub(crate) fn persistence(source: impl std::fmt::Display) -> Self {
        Error::Persistence(source.to_string())
    }

    pub(crate) fn stale_handle(label: &str) -> Self {
        Error::InvalidArgument(format!("{label} handle is stale or already released"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
