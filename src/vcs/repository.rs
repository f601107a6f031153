// ABOUTME: Clone and fetch with staged SSH credentials and known_hosts checks.
// ABOUTME: Staged key files are removed once the transfer finishes, whatever the outcome.

use super::callbacks::remote_callbacks;
use super::error::{
    AuthSnafu, CloneSnafu, FetchSnafu, MissingUrlSnafu, OpenSnafu, RemoteSnafu, Result,
};
use crate::auth::{CallbackBuilder, CleanupChain, KnownHosts, RemoteOptions, Stager, TempFileStager};
use git2::build::RepoBuilder;
use git2::{AutotagOption, FetchOptions};
use snafu::{OptionExt, ResultExt};
use std::path::{Path, PathBuf};

/// Name of the remote refreshed by [`Repository::update_everything`].
pub const DEFAULT_REMOTE: &str = "origin";

/// Options for a single clone.
#[derive(Debug, Clone, Default)]
pub struct CloneOptions {
    /// Create a bare repository without a working tree.
    pub bare: bool,
    pub remote: RemoteOptions,
}

impl CloneOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bare(mut self, bare: bool) -> Self {
        self.bare = bare;
        self
    }

    pub fn remote(mut self, remote: RemoteOptions) -> Self {
        self.remote = remote;
        self
    }
}

/// A local git repository.
pub struct Repository {
    inner: git2::Repository,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.inner.path())
            .finish()
    }
}

impl Repository {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let inner = git2::Repository::open(path).context(OpenSnafu { path })?;
        Ok(Self { inner })
    }

    /// Path of the `.git` directory, or the repository itself when bare.
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    pub fn is_bare(&self) -> bool {
        self.inner.is_bare()
    }

    /// The underlying libgit2 handle.
    pub fn git(&self) -> &git2::Repository {
        &self.inner
    }

    /// Fetch all refs and tags from `origin` using the process-wide
    /// known hosts.
    pub fn update_everything(&self, options: &RemoteOptions) -> Result<()> {
        GitClient::new().update_everything(self, options)
    }
}

/// Clone `url` into `dir` using the process-wide known hosts.
pub fn clone(url: &str, dir: impl AsRef<Path>, options: &CloneOptions) -> Result<Repository> {
    GitClient::new().clone_repository(url, dir, options)
}

/// Runs remote operations with callbacks from a [`CallbackBuilder`].
#[derive(Debug, Clone)]
pub struct GitClient<S = TempFileStager> {
    builder: CallbackBuilder<S>,
}

impl GitClient<TempFileStager> {
    pub fn new() -> Self {
        Self::with_builder(CallbackBuilder::new(KnownHosts::standard()))
    }

    /// Stage keys under `dir` instead of the system temp directory.
    pub fn staging_dir(self, dir: impl Into<PathBuf>) -> Self {
        Self {
            builder: self.builder.with_stager(TempFileStager::in_dir(dir)),
        }
    }
}

impl Default for GitClient<TempFileStager> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Stager> GitClient<S> {
    pub fn with_builder(builder: CallbackBuilder<S>) -> Self {
        Self { builder }
    }

    pub fn clone_repository(
        &self,
        url: &str,
        dir: impl AsRef<Path>,
        options: &CloneOptions,
    ) -> Result<Repository> {
        let dir = dir.as_ref();
        tracing::debug!("cloning {} into {}", url, dir.display());

        let (bundle, cleanup) = self.builder.build(url, &options.remote).context(AuthSnafu { url })?;

        let cloned = {
            let mut fetch_options = FetchOptions::new();
            if !bundle.is_empty() {
                fetch_options.remote_callbacks(remote_callbacks(&bundle));
            }
            RepoBuilder::new()
                .bare(options.bare)
                .fetch_options(fetch_options)
                .clone(url, dir)
        };
        release(cleanup);

        let inner = cloned.context(CloneSnafu { url })?;
        tracing::debug!("cloned {} into {}", url, inner.path().display());
        Ok(Repository { inner })
    }

    /// Fetch all refs and tags from `origin`.
    pub fn update_everything(&self, repository: &Repository, options: &RemoteOptions) -> Result<()> {
        self.update_remote(repository, DEFAULT_REMOTE, options)
    }

    /// Fetch the configured refspecs and all tags from remote `name`.
    pub fn update_remote(
        &self,
        repository: &Repository,
        name: &str,
        options: &RemoteOptions,
    ) -> Result<()> {
        let mut remote = repository
            .inner
            .find_remote(name)
            .context(RemoteSnafu { name })?;
        let url = remote.url().context(MissingUrlSnafu { name })?.to_string();
        tracing::debug!("fetching {} from {}", name, url);

        let (bundle, cleanup) = self.builder.build(&url, options).context(AuthSnafu { url: &url })?;

        let fetched = {
            let mut fetch_options = FetchOptions::new();
            fetch_options.download_tags(AutotagOption::All);
            if !bundle.is_empty() {
                fetch_options.remote_callbacks(remote_callbacks(&bundle));
            }
            remote.fetch::<&str>(&[], Some(&mut fetch_options), None)
        };
        release(cleanup);

        fetched.context(FetchSnafu { url })
    }
}

fn release(cleanup: CleanupChain) {
    if let Err(e) = cleanup.run() {
        tracing::warn!("failed to remove staged SSH keys: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::ErrorKind;

    #[test]
    fn open_missing_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Repository::open(dir.path().join("missing")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Open);
    }

    #[test]
    fn update_without_origin_fails() {
        let dir = tempfile::tempdir().unwrap();
        git2::Repository::init(dir.path()).unwrap();
        let repository = Repository::open(dir.path()).unwrap();

        let err = repository
            .update_everything(&RemoteOptions::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Remote);
    }

    #[test]
    fn clone_of_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("nothing-here");
        let url = format!("file://{}", source.display());

        let err = GitClient::with_builder(CallbackBuilder::new(std::sync::Arc::new(
            KnownHosts::new(),
        )))
        .clone_repository(&url, dir.path().join("dest"), &CloneOptions::new())
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Clone);
    }

    #[test]
    fn clone_options_builder() {
        let options = CloneOptions::new().bare(true);
        assert!(options.bare);
        assert!(options.remote.ssh.is_none());
    }
}
