// ABOUTME: Adapts a CallbackBundle to libgit2's remote callbacks.
// ABOUTME: Translates credential requests and host certificates between the two worlds.

use crate::auth::{
    AllowedCredentials, CallbackBundle, Credential, Decision, Fingerprint, HostCertificate,
    HostVerifier,
};
use git2::cert::{Cert, CertHostkey};
use git2::{CertificateCheckStatus, Cred, CredentialType, ErrorClass, ErrorCode, RemoteCallbacks};

/// Remote callbacks driven by `bundle`.
///
/// An empty bundle yields callbacks with no handlers, leaving libgit2 on
/// its defaults.
pub fn remote_callbacks(bundle: &CallbackBundle) -> RemoteCallbacks<'_> {
    let mut callbacks = RemoteCallbacks::new();

    if let Some(selector) = bundle.credential_selector() {
        let mut key_offered = false;
        callbacks.credentials(move |url, username_from_url, allowed| {
            let credential = selector.select(url, username_from_url, allowed_credentials(allowed));
            to_git_credential(credential, &mut key_offered)
        });
    }

    if let Some(verifier) = bundle.host_verifier() {
        callbacks.certificate_check(move |cert, hostname| check_certificate(verifier, cert, hostname));
    }

    callbacks
}

fn allowed_credentials(allowed: CredentialType) -> AllowedCredentials {
    AllowedCredentials {
        ssh_key: allowed.contains(CredentialType::SSH_KEY),
        username: allowed.contains(CredentialType::USERNAME),
    }
}

fn to_git_credential(credential: Credential, key_offered: &mut bool) -> Result<Cred, git2::Error> {
    match credential {
        Credential::SshKey {
            username,
            public_key,
            private_key,
            passphrase,
        } => {
            // libgit2 keeps asking after a refused key; stop after one offer.
            if *key_offered {
                return Err(git2::Error::new(
                    ErrorCode::Auth,
                    ErrorClass::Callback,
                    format!("SSH key for {username} was rejected by the remote"),
                ));
            }
            *key_offered = true;
            let passphrase = (!passphrase.is_empty()).then_some(passphrase.as_str());
            Cred::ssh_key(&username, Some(&public_key), &private_key, passphrase)
        }
        Credential::Username(username) => Cred::username(&username),
        Credential::Unavailable => Cred::default(),
    }
}

fn check_certificate(
    verifier: &HostVerifier,
    cert: &Cert<'_>,
    hostname: &str,
) -> Result<CertificateCheckStatus, git2::Error> {
    check_host_key(verifier, cert.as_hostkey().map(host_certificate), hostname)
}

/// `None` means a TLS certificate, which is libgit2's business.
fn check_host_key(
    verifier: &HostVerifier,
    certificate: Option<HostCertificate>,
    hostname: &str,
) -> Result<CertificateCheckStatus, git2::Error> {
    let Some(certificate) = certificate else {
        return Ok(CertificateCheckStatus::CertificatePassthrough);
    };

    // git2 does not surface libgit2's own validity flag.
    certificate_status(verifier.verify(Some(&certificate), false, hostname), hostname)
}

fn certificate_status(
    decision: Decision,
    hostname: &str,
) -> Result<CertificateCheckStatus, git2::Error> {
    match decision {
        Decision::Accept => Ok(CertificateCheckStatus::CertificateOk),
        Decision::Reject => Err(git2::Error::new(
            ErrorCode::Certificate,
            ErrorClass::Callback,
            format!("host key for {hostname} is not in known_hosts"),
        )),
    }
}

fn host_certificate(host_key: &CertHostkey<'_>) -> HostCertificate {
    HostCertificate {
        host_key: host_key.hostkey().map(<[u8]>::to_vec),
        key_type: host_key.hostkey_type().map(|t| t.name().to_string()),
        fingerprints: digests_to_fingerprints(
            host_key.hash_md5(),
            host_key.hash_sha1(),
            host_key.hash_sha256(),
        ),
    }
}

fn digests_to_fingerprints(
    md5: Option<&[u8; 16]>,
    sha1: Option<&[u8; 20]>,
    sha256: Option<&[u8; 32]>,
) -> Vec<Fingerprint> {
    let mut fingerprints = Vec::new();
    if let Some(hash) = sha256 {
        fingerprints.push(Fingerprint::Sha256(*hash));
    }
    if let Some(hash) = sha1 {
        fingerprints.push(Fingerprint::Sha1(*hash));
    }
    if let Some(hash) = md5 {
        fingerprints.push(Fingerprint::Md5(*hash));
    }
    fingerprints
}
