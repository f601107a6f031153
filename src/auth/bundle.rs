// ABOUTME: Builds the credential and host-check callbacks for one remote operation.
// ABOUTME: Stages key files and returns the cleanup chain that removes them.

use super::cleanup::CleanupChain;
use super::credential::{AllowedCredentials, Credential, CredentialSelector, KeyPaths};
use super::error::Result;
use super::known_hosts::KnownHosts;
use super::options::{RemoteOptions, SshOptions};
use super::stage::{Stager, TempFileStager, derive_public_key};
use super::verify::{Decision, HostCertificate, HostVerifier};
use std::sync::Arc;

/// Callbacks the transfer engine invokes during the handshake.
///
/// An empty bundle means the operation has no SSH configuration and the
/// engine should use its defaults.
#[derive(Debug, Clone, Default)]
pub struct CallbackBundle {
    selector: Option<CredentialSelector>,
    verifier: Option<HostVerifier>,
}

impl CallbackBundle {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.selector.is_none() && self.verifier.is_none()
    }

    pub fn credential_selector(&self) -> Option<&CredentialSelector> {
        self.selector.as_ref()
    }

    pub fn host_verifier(&self) -> Option<&HostVerifier> {
        self.verifier.as_ref()
    }

    /// Credential callback. `None` when the bundle is empty.
    pub fn credentials(
        &self,
        url: &str,
        username_from_url: Option<&str>,
        allowed: AllowedCredentials,
    ) -> Option<Credential> {
        self.selector
            .as_ref()
            .map(|s| s.select(url, username_from_url, allowed))
    }

    /// Certificate-check callback. `None` when the bundle is empty.
    pub fn check_certificate(
        &self,
        certificate: Option<&HostCertificate>,
        claimed_valid: bool,
        hostname: &str,
    ) -> Option<Decision> {
        self.verifier
            .as_ref()
            .map(|v| v.verify(certificate, claimed_valid, hostname))
    }
}

/// Assembles a [`CallbackBundle`] around staged key material.
#[derive(Debug, Clone)]
pub struct CallbackBuilder<S = TempFileStager> {
    known_hosts: Arc<KnownHosts>,
    stager: S,
}

impl CallbackBuilder<TempFileStager> {
    pub fn new(known_hosts: Arc<KnownHosts>) -> Self {
        Self {
            known_hosts,
            stager: TempFileStager::new(),
        }
    }
}

impl<S: Stager> CallbackBuilder<S> {
    pub fn with_stager<T: Stager>(self, stager: T) -> CallbackBuilder<T> {
        CallbackBuilder {
            known_hosts: self.known_hosts,
            stager,
        }
    }

    /// Stage keys and wire the callbacks for an operation against `url`.
    ///
    /// On failure everything staged so far has already been removed; the
    /// caller has nothing to clean up.
    pub fn build(
        &self,
        url: &str,
        options: &RemoteOptions,
    ) -> Result<(CallbackBundle, CleanupChain)> {
        let Some(ssh) = &options.ssh else {
            return Ok((CallbackBundle::empty(), CleanupChain::new()));
        };
        tracing::debug!("building SSH callbacks for {}", url);

        let mut cleanup = CleanupChain::new();
        let keys = match self.stage_keys(url, ssh, &mut cleanup) {
            Ok(keys) => keys,
            Err(e) => {
                if let Err(cleanup_err) = cleanup.run() {
                    tracing::warn!("cleanup after failed staging also failed: {}", cleanup_err);
                }
                return Err(e);
            }
        };

        let bundle = CallbackBundle {
            selector: Some(CredentialSelector::new(ssh.user.clone(), keys)),
            verifier: Some(
                HostVerifier::new(Arc::clone(&self.known_hosts)).port(remote_port(url)),
            ),
        };
        Ok((bundle, cleanup))
    }

    fn stage_keys(
        &self,
        url: &str,
        ssh: &SshOptions,
        cleanup: &mut CleanupChain,
    ) -> Result<Option<KeyPaths>> {
        let Some(private_key) = &ssh.private_key else {
            return Ok(None);
        };

        let private = self.stager.stage(url, private_key)?;
        let private_path = private.path().to_path_buf();
        cleanup.push(move || private.release());

        let public_key = match &ssh.public_key {
            Some(key) => key.clone(),
            None => derive_public_key(private_key)?,
        };

        let public = self.stager.stage(url, &public_key)?;
        let public_path = public.path().to_path_buf();
        cleanup.push(move || public.release());

        Ok(Some(KeyPaths {
            private_key: private_path,
            public_key: public_path,
        }))
    }
}

/// Build callbacks using the process-wide known hosts and the system temp
/// directory.
pub fn build(url: &str, options: &RemoteOptions) -> Result<(CallbackBundle, CleanupChain)> {
    CallbackBuilder::new(KnownHosts::standard()).build(url, options)
}

/// Explicit port of an `ssh://` style URL. scp-like URLs carry none.
fn remote_port(url: &str) -> Option<u16> {
    let rest = ["ssh://", "git+ssh://", "ssh+git://"]
        .iter()
        .find_map(|scheme| url.strip_prefix(scheme))?;
    let authority = rest.split('/').next()?;
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);

    if let Some(bracketed) = host_port.strip_prefix('[') {
        let (_, after) = bracketed.split_once(']')?;
        return after.strip_prefix(':')?.parse().ok();
    }
    host_port.rsplit_once(':')?.1.parse().ok()
}
