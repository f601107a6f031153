// ABOUTME: Host key fingerprints over SSH wire-format key blobs.
// ABOUTME: Supports the MD5, SHA-1 and SHA-256 digests libgit2 reports.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fmt;

/// Digest algorithm of a fingerprint, ordered weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashKind {
    Md5,
    Sha1,
    Sha256,
}

/// Hash of a host's public key blob.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Fingerprint {
    Md5([u8; 16]),
    Sha1([u8; 20]),
    Sha256([u8; 32]),
}

impl Fingerprint {
    /// Hash `key_blob` with the given algorithm.
    pub fn compute(kind: HashKind, key_blob: &[u8]) -> Self {
        match kind {
            HashKind::Md5 => {
                let mut out = [0u8; 16];
                out.copy_from_slice(&Md5::digest(key_blob));
                Fingerprint::Md5(out)
            }
            HashKind::Sha1 => {
                let mut out = [0u8; 20];
                out.copy_from_slice(&Sha1::digest(key_blob));
                Fingerprint::Sha1(out)
            }
            HashKind::Sha256 => {
                let mut out = [0u8; 32];
                out.copy_from_slice(&Sha256::digest(key_blob));
                Fingerprint::Sha256(out)
            }
        }
    }

    pub fn kind(&self) -> HashKind {
        match self {
            Fingerprint::Md5(_) => HashKind::Md5,
            Fingerprint::Sha1(_) => HashKind::Sha1,
            Fingerprint::Sha256(_) => HashKind::Sha256,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Fingerprint::Md5(b) => b,
            Fingerprint::Sha1(b) => b,
            Fingerprint::Sha256(b) => b,
        }
    }

    /// Whether this fingerprint was computed over `key_blob`.
    pub fn matches_key(&self, key_blob: &[u8]) -> bool {
        Fingerprint::compute(self.kind(), key_blob) == *self
    }
}

/// Formats like `ssh-keygen -l`: `MD5:aa:bb:...` or `SHA256:<base64>`.
impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fingerprint::Md5(bytes) => {
                let hex: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();
                write!(f, "MD5:{}", hex.join(":"))
            }
            Fingerprint::Sha1(bytes) => write!(f, "SHA1:{}", STANDARD_NO_PAD.encode(bytes)),
            Fingerprint::Sha256(bytes) => write!(f, "SHA256:{}", STANDARD_NO_PAD.encode(bytes)),
        }
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;

    // ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIDIXN1YGfRm2I7OwsoyfNdI1xMWhTqZkUXhz+Josl992
    const KEY_B64: &str = "AAAAC3NzaC1lZDI1NTE5AAAAIDIXN1YGfRm2I7OwsoyfNdI1xMWhTqZkUXhz+Josl992";

    fn blob() -> Vec<u8> {
        STANDARD.decode(KEY_B64).unwrap()
    }

    #[test]
    fn md5_matches_ssh_keygen_output() {
        let fp = Fingerprint::compute(HashKind::Md5, &blob());
        assert_eq!(
            fp.to_string(),
            "MD5:45:8b:a0:3a:cb:a5:a1:04:00:23:69:54:b2:6d:83:e1"
        );
    }

    #[test]
    fn sha256_matches_ssh_keygen_output() {
        let fp = Fingerprint::compute(HashKind::Sha256, &blob());
        assert_eq!(
            fp.to_string(),
            "SHA256:mwt8f08+RKeRSAnW+4K1s0ll8ZW9V9Xf3pRiq1H5jWw"
        );
    }

    #[test]
    fn matches_key_rejects_other_blob() {
        let fp = Fingerprint::compute(HashKind::Sha1, &blob());
        assert!(fp.matches_key(&blob()));
        let mut other = blob();
        other[20] ^= 0xff;
        assert!(!fp.matches_key(&other));
    }

    #[test]
    fn kinds_order_by_strength() {
        assert!(HashKind::Sha256 > HashKind::Sha1);
        assert!(HashKind::Sha1 > HashKind::Md5);
    }
}
