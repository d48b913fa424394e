//! Error types for the sync core.

use crate::crypto::CryptoError;
use thiserror::Error;
use vaultkit_api::ApiError;
use vaultkit_store::StoreError;

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Errors surfaced by the sync core.
///
/// Mutation callers can render these directly: `RemoteRejected` carries the
/// server's own message, everything else maps to a generic failure string.
#[derive(Debug, Error)]
pub enum VaultError {
    /// No active unlocked vault session; never retried automatically.
    #[error("no active unlocked vault session")]
    InvalidState,

    /// The network is absent.
    #[error("network unreachable")]
    Connectivity,

    /// The server rejected the request with a user-displayable message.
    #[error("rejected by server: {message}")]
    RemoteRejected { message: String },

    /// Encryption or decryption failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// The disk store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// File system failure (attachment staging).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else; logged, surfaced non-specifically.
    #[error("{0}")]
    Internal(String),
}

impl From<ApiError> for VaultError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Connectivity(_) => VaultError::Connectivity,
            ApiError::Invalid { message } => VaultError::RemoteRejected { message },
            ApiError::Io(err) => VaultError::Io(err),
            other => VaultError::Internal(other.to_string()),
        }
    }
}
