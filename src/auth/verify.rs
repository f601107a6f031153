// ABOUTME: Decides whether a remote's presented host key may be trusted.
// ABOUTME: Fails closed: only a positive known_hosts match accepts a host.

use super::fingerprint::{Fingerprint, HashKind};
use super::known_hosts::{HostKey, KnownHosts};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

static INSECURE_SKIP_HOST_VERIFICATION: AtomicBool = AtomicBool::new(false);

/// Disable host key verification for the whole process.
///
/// **Security hazard:** while enabled every host is accepted, so the process
/// is open to man-in-the-middle attacks. Only for controlled test
/// environments. Off by default.
pub fn set_insecure_skip_host_verification(skip: bool) {
    if skip {
        tracing::warn!("SSH host key verification disabled; connections can be intercepted");
    }
    INSECURE_SKIP_HOST_VERIFICATION.store(skip, Ordering::SeqCst);
}

pub fn insecure_skip_host_verification() -> bool {
    INSECURE_SKIP_HOST_VERIFICATION.load(Ordering::SeqCst)
}

/// Outcome of a host key check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

/// Identity a remote presented during the handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostCertificate {
    /// Raw host key blob, when the engine exposes it.
    pub host_key: Option<Vec<u8>>,
    /// Key type name, e.g. `ssh-ed25519`.
    pub key_type: Option<String>,
    /// Fingerprints reported by the engine.
    pub fingerprints: Vec<Fingerprint>,
}

impl HostCertificate {
    pub fn from_fingerprint(fingerprint: Fingerprint) -> Self {
        Self {
            fingerprints: vec![fingerprint],
            ..Default::default()
        }
    }

    pub fn from_host_key(key_type: impl Into<String>, blob: impl Into<Vec<u8>>) -> Self {
        Self {
            host_key: Some(blob.into()),
            key_type: Some(key_type.into()),
            fingerprints: Vec::new(),
        }
    }

    pub fn strongest_fingerprint(&self) -> Option<&Fingerprint> {
        self.fingerprints.iter().max_by_key(|fp| fp.kind())
    }

    /// Whether this certificate identifies `key`.
    ///
    /// With the raw key available the blobs are compared exactly; otherwise
    /// the strongest fingerprint is recomputed over the trusted key.
    fn identifies(&self, key: &HostKey) -> bool {
        if let Some(blob) = &self.host_key {
            return *blob == key.blob;
        }
        self.strongest_fingerprint()
            .is_some_and(|fp| fp.matches_key(&key.blob))
    }
}

impl fmt::Display for HostCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key_type = self.key_type.as_deref().unwrap_or("unknown key type");
        match (&self.host_key, self.strongest_fingerprint()) {
            (Some(blob), _) => write!(
                f,
                "{} {}",
                key_type,
                Fingerprint::compute(HashKind::Sha256, blob)
            ),
            (None, Some(fp)) => write!(f, "{} {}", key_type, fp),
            (None, None) => write!(f, "{} without fingerprint", key_type),
        }
    }
}

/// Checks presented host keys against the known hosts registry.
#[derive(Debug, Clone)]
pub struct HostVerifier {
    known_hosts: Arc<KnownHosts>,
    port: Option<u16>,
}

impl HostVerifier {
    pub fn new(known_hosts: Arc<KnownHosts>) -> Self {
        Self {
            known_hosts,
            port: None,
        }
    }

    /// Port of the remote. A non-default port is looked up only as
    /// `[host]:port`, so a key trusted on port 22 does not vouch for it.
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Decide whether the connection to `hostname` may proceed.
    ///
    /// `_claimed_valid` is the transport's own verdict. It is deliberately
    /// ignored: the transport may not check anything, and trusting its flag
    /// would let an unverified host through.
    pub fn verify(
        &self,
        certificate: Option<&HostCertificate>,
        _claimed_valid: bool,
        hostname: &str,
    ) -> Decision {
        if insecure_skip_host_verification() {
            tracing::warn!("accepting SSH host {} without verification", hostname);
            return Decision::Accept;
        }

        let Some(certificate) = certificate else {
            tracing::warn!("SSH host {} presented no certificate", hostname);
            return Decision::Reject;
        };

        let names = self.candidate_names(hostname);

        for name in &names {
            if let Some(revoked) = self
                .known_hosts
                .revoked(name)
                .into_iter()
                .find(|key| certificate.identifies(key))
            {
                tracing::warn!(
                    "SSH host key for {} is revoked ({}): {}",
                    hostname,
                    revoked.location,
                    certificate
                );
                return Decision::Reject;
            }
        }

        for name in &names {
            let Some(keys) = self.known_hosts.lookup(name) else {
                continue;
            };
            if let Some(key) = keys.into_iter().find(|key| certificate.identifies(key)) {
                tracing::debug!("SSH host key for {} matches {}", hostname, key.location);
                return Decision::Accept;
            }
        }

        tracing::warn!("invalid certificate for SSH host {}: {}", hostname, certificate);
        Decision::Reject
    }

    fn candidate_names(&self, hostname: &str) -> Vec<String> {
        match self.port {
            Some(port) if port != 22 => vec![format!("[{}]:{}", hostname, port)],
            _ => vec![hostname.to_string()],
        }
    }
}
