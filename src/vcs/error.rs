// ABOUTME: Errors for clone and fetch operations, SNAFU style.
// ABOUTME: Each variant names the phase that failed, with a kind for programmatic handling.

use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("failed to prepare SSH authentication for {url}: {source}"))]
    Auth {
        url: String,
        source: crate::auth::Error,
    },

    #[snafu(display("failed to clone {url}: {source}"))]
    Clone { url: String, source: git2::Error },

    #[snafu(display("failed to open repository at {}: {source}", path.display()))]
    Open { path: PathBuf, source: git2::Error },

    #[snafu(display("failed to load remote {name}: {source}"))]
    Remote { name: String, source: git2::Error },

    #[snafu(display("remote {name} has no usable URL"))]
    MissingUrl { name: String },

    #[snafu(display("failed to fetch from {url}: {source}"))]
    Fetch { url: String, source: git2::Error },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Key staging or derivation failed before any network activity.
    Auth,
    /// Clone failed, including host key rejection and refused credentials.
    Clone,
    /// Local repository could not be opened.
    Open,
    /// Remote lookup failed or the remote has no URL.
    Remote,
    /// Fetch failed, including host key rejection and refused credentials.
    Fetch,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Auth { .. } => ErrorKind::Auth,
            Error::Clone { .. } => ErrorKind::Clone,
            Error::Open { .. } => ErrorKind::Open,
            Error::Remote { .. } | Error::MissingUrl { .. } => ErrorKind::Remote,
            Error::Fetch { .. } => ErrorKind::Fetch,
        }
    }

    /// Whether the engine aborted because the host key was not trusted.
    pub fn is_host_key_rejected(&self) -> bool {
        match self {
            Error::Clone { source, .. } | Error::Fetch { source, .. } => {
                source.code() == git2::ErrorCode::Certificate
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
