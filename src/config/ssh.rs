// ABOUTME: SSH section of keyward.yml.
// ABOUTME: Points at key files on disk and reads them into SshOptions.

use crate::auth::SshOptions;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SshConfig {
    /// Login name used when the URL carries none.
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub private_key: Option<PathBuf>,
    /// Derived from the private key when omitted.
    #[serde(default)]
    pub public_key: Option<PathBuf>,
}

impl SshConfig {
    /// Read the configured key files.
    pub fn to_options(&self) -> Result<SshOptions> {
        let mut options = SshOptions::new(self.user.clone().unwrap_or_default());
        if let Some(path) = &self.private_key {
            options = options.private_key(read_key(path)?);
        }
        if let Some(path) = &self.public_key {
            options = options.public_key(read_key(path)?);
        }
        Ok(options)
    }
}

fn read_key(path: &Path) -> Result<Vec<u8>> {
    let path = expand_home(path);
    tracing::debug!("reading SSH key {}", path.display());
    std::fs::read(&path).map_err(|e| Error::KeyLoadFailed {
        path,
        reason: e.to_string(),
    })
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}
