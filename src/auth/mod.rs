// ABOUTME: SSH authentication and host verification for remote git operations.
// ABOUTME: Stages key material, selects credentials and checks host keys against known_hosts.

mod bundle;
mod cleanup;
mod credential;
mod error;
mod fingerprint;
mod known_hosts;
mod options;
mod stage;
mod verify;

pub use bundle::{CallbackBuilder, CallbackBundle, build};
pub use cleanup::CleanupChain;
pub use credential::{AllowedCredentials, Credential, CredentialSelector, KeyPaths};
pub use error::{Error, Result};
pub use fingerprint::{Fingerprint, HashKind};
pub use known_hosts::{HostKey, KnownHosts, Location};
pub use options::{RemoteOptions, SshOptions};
pub use stage::{StagedKey, Stager, TempFileStager, derive_public_key};
pub use verify::{
    Decision, HostCertificate, HostVerifier, insecure_skip_host_verification,
    set_insecure_skip_host_verification,
};
