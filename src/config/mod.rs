// ABOUTME: Configuration types and parsing for keyward.yml.
// ABOUTME: Handles YAML parsing, config discovery and turning settings into remote options.

mod repository;
mod ssh;

pub use repository::RepositoryConfig;
pub use ssh::{SshConfig, expand_home};

use crate::auth::{CallbackBuilder, KnownHosts, RemoteOptions};
use crate::error::{Error, Result};
use crate::vcs::GitClient;
use repository::RepositoryEntry;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const CONFIG_FILENAME: &str = "keyward.yml";
pub const CONFIG_FILENAME_ALT: &str = "keyward.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".keyward/config.yml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ssh: Option<SshConfig>,

    /// known_hosts files to trust instead of the system and user files.
    #[serde(default)]
    pub known_hosts: Option<Vec<PathBuf>>,

    /// Directory for staged key files. Defaults to the system temp directory.
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    #[serde(default, deserialize_with = "deserialize_repositories")]
    pub repositories: Vec<RepositoryConfig>,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("using configuration {}", path.display());
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Like [`Config::discover`], but an absent file yields the defaults.
    pub fn discover_or_default(dir: &Path) -> Result<Self> {
        match Self::discover(dir) {
            Err(Error::ConfigNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Remote options with the configured key files read into memory.
    pub fn remote_options(&self) -> Result<RemoteOptions> {
        match &self.ssh {
            Some(ssh) => Ok(RemoteOptions::new().ssh(ssh.to_options()?)),
            None => Ok(RemoteOptions::new()),
        }
    }

    /// Trusted host keys: the configured files, or the standard ones.
    pub fn known_hosts(&self) -> Arc<KnownHosts> {
        match &self.known_hosts {
            Some(paths) => {
                let paths: Vec<PathBuf> = paths.iter().map(|p| expand_home(p)).collect();
                let known_hosts = KnownHosts::load(&paths);
                if known_hosts.is_empty() {
                    tracing::warn!("configured known_hosts files contain no usable entries");
                }
                Arc::new(known_hosts)
            }
            None => KnownHosts::standard(),
        }
    }

    /// Git client honoring `known_hosts` and `staging_dir`.
    pub fn git_client(&self) -> GitClient {
        let client = GitClient::with_builder(CallbackBuilder::new(self.known_hosts()));
        match &self.staging_dir {
            Some(dir) => client.staging_dir(expand_home(dir)),
            None => client,
        }
    }
}

fn deserialize_repositories<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<RepositoryConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<RepositoryEntry> = Vec::deserialize(deserializer)?;
    values
        .into_iter()
        .map(|entry| entry.into_repository_config())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(serde::de::Error::custom)
}
