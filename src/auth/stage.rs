// ABOUTME: Stages key material into owner-only transient files.
// ABOUTME: Each staged key is deleted when released or dropped.

use super::error::{Error, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Longest label fragment embedded in a staged file name.
const MAX_LABEL_LEN: usize = 40;

/// Writes key bytes somewhere the transfer engine can read them by path.
pub trait Stager: Send + Sync {
    /// Stage `key_bytes` under a fresh, uniquely named file. `label` only
    /// influences the file name.
    fn stage(&self, label: &str, key_bytes: &[u8]) -> Result<StagedKey>;
}

/// Stages keys as temporary files, by default in the system temp directory.
#[derive(Debug, Clone, Default)]
pub struct TempFileStager {
    dir: Option<PathBuf>,
}

impl TempFileStager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage into `dir` instead of the system temp directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }
}

impl Stager for TempFileStager {
    fn stage(&self, label: &str, key_bytes: &[u8]) -> Result<StagedKey> {
        let prefix = format!("keyward-{}-", sanitize_label(label));
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);

        // tempfile opens with O_EXCL and mode 0600 on unix.
        let created = match &self.dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        let mut file = created.map_err(|source| Error::Staging {
            label: label.to_string(),
            source,
        })?;

        if let Err(source) = write_key(&mut file, key_bytes) {
            // Never leave a partial key behind.
            if let Err(e) = file.close() {
                tracing::warn!("failed to remove partially staged key: {}", e);
            }
            return Err(Error::Staging {
                label: label.to_string(),
                source,
            });
        }

        tracing::debug!("staged key material at {}", file.path().display());
        Ok(StagedKey {
            path: file.path().to_path_buf(),
            file,
        })
    }
}

fn write_key(file: &mut NamedTempFile, key_bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(key_bytes)?;
    file.as_file().sync_all()
}

fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .take(MAX_LABEL_LEN)
        .collect()
}

/// Key material persisted for the duration of one operation.
///
/// Dropping a `StagedKey` deletes the file; [`StagedKey::release`] does the
/// same and reports failures.
#[derive(Debug)]
pub struct StagedKey {
    path: PathBuf,
    file: NamedTempFile,
}

impl StagedKey {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close and delete the staged file.
    pub fn release(self) -> Result<()> {
        tracing::debug!("releasing staged key {}", self.path.display());
        self.file.close().map_err(Error::Cleanup)
    }
}

/// Derive the authorized_keys line (`"<type> <base64>\n"`) for an
/// unencrypted private key.
pub fn derive_public_key(private_key: &[u8]) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(private_key).map_err(|_| Error::KeyDerivation {
        reason: "private key is not valid UTF-8 text".to_string(),
    })?;
    let key = russh::keys::decode_secret_key(text, None).map_err(|e| Error::KeyDerivation {
        reason: e.to_string(),
    })?;

    let public = key.public_key();
    let blob = public.to_bytes().map_err(|e| Error::KeyDerivation {
        reason: e.to_string(),
    })?;

    Ok(format!("{} {}\n", public.algorithm().as_str(), STANDARD.encode(blob)).into_bytes())
}
