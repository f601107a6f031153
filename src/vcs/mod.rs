// ABOUTME: Git clone and fetch on top of libgit2.
// ABOUTME: Wires the auth callbacks into every remote operation.

mod callbacks;
mod error;
mod repository;

pub use callbacks::remote_callbacks;
pub use error::{Error, ErrorKind, Result};
pub use repository::{CloneOptions, DEFAULT_REMOTE, GitClient, Repository, clone};
