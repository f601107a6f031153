// ABOUTME: Repository entries for `keyward sync`.
// ABOUTME: Parses a bare URL or a detailed {url, dir, bare} mapping.

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub url: String,
    /// Local checkout directory, relative to the working directory unless absolute.
    pub dir: PathBuf,
    pub bare: bool,
}

impl RepositoryConfig {
    /// Parse the short form: just a URL, directory inferred from its last
    /// path segment.
    pub fn parse(s: &str) -> Result<Self, String> {
        let url = s.trim();
        if url.is_empty() {
            return Err("repository URL cannot be empty".to_string());
        }

        Ok(RepositoryConfig {
            url: url.to_string(),
            dir: Self::default_dir(url, false)?,
            bare: false,
        })
    }

    /// Directory git itself would pick for `url`: the last path segment
    /// without `.git`, keeping the suffix for bare repositories.
    pub fn default_dir(url: &str, bare: bool) -> Result<PathBuf, String> {
        infer_dir(url, bare).map(PathBuf::from)
    }
}

fn infer_dir(url: &str, bare: bool) -> Result<String, String> {
    let path = repository_path(url).trim_end_matches('/');
    let last = path.rsplit('/').next().unwrap_or(path);
    let name = last.strip_suffix(".git").unwrap_or(last);

    if name.is_empty() {
        return Err(format!("cannot infer a directory name from {url}"));
    }
    Ok(if bare {
        format!("{name}.git")
    } else {
        name.to_string()
    })
}

/// Path part of `url`, with `scheme://[user@]host[:port]` or the scp-like
/// `[user@]host:` prefix removed.
fn repository_path(url: &str) -> &str {
    if let Some((_, rest)) = url.split_once("://") {
        return rest.find('/').map_or("", |slash| &rest[slash..]);
    }
    match url.find(':') {
        Some(colon) if !url[..colon].contains('/') => &url[colon + 1..],
        _ => url,
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum RepositoryEntry {
    Simple(String),
    Detailed {
        url: String,
        #[serde(default)]
        dir: Option<PathBuf>,
        #[serde(default)]
        bare: bool,
    },
}

impl RepositoryEntry {
    pub(super) fn into_repository_config(self) -> Result<RepositoryConfig, String> {
        match self {
            RepositoryEntry::Simple(s) => RepositoryConfig::parse(&s),
            RepositoryEntry::Detailed { url, dir, bare } => {
                let dir = match dir {
                    Some(dir) => dir,
                    None => RepositoryConfig::default_dir(&url, bare)?,
                };
                Ok(RepositoryConfig { url, dir, bare })
            }
        }
    }
}
