// ABOUTME: Error types for credential staging and key handling.
// ABOUTME: Covers transient file failures and private key parsing failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to stage key material for {label}: {source}")]
    Staging {
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to derive public key from private key: {reason}")]
    KeyDerivation { reason: String },

    #[error("failed to remove staged key material: {0}")]
    Cleanup(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
