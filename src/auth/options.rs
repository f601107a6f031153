// ABOUTME: Caller-supplied options for a single remote operation.
// ABOUTME: Carries the SSH user and key material handed to the callback builder.

use std::fmt;

/// Options for one clone or fetch.
#[derive(Debug, Clone, Default)]
pub struct RemoteOptions {
    /// SSH settings. When absent the transfer engine uses its default,
    /// non-SSH path and no callbacks are installed.
    pub ssh: Option<SshOptions>,
}

impl RemoteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ssh(mut self, ssh: SshOptions) -> Self {
        self.ssh = Some(ssh);
        self
    }
}

/// SSH user and key material.
///
/// Key bytes are kept exactly as supplied. If `private_key` is set and
/// `public_key` is not, the public key is derived before staging.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SshOptions {
    /// Username used when the URL does not embed one. Empty means unset.
    pub user: String,
    /// Unencrypted private key (OpenSSH or PEM).
    pub private_key: Option<Vec<u8>>,
    /// Public key in authorized_keys form.
    pub public_key: Option<Vec<u8>>,
}

impl SshOptions {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..Default::default()
        }
    }

    pub fn private_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.private_key = Some(key.into());
        self
    }

    pub fn public_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.public_key = Some(key.into());
        self
    }
}

// Key bytes never reach logs.
impl fmt::Debug for SshOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshOptions")
            .field("user", &self.user)
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "<redacted>"),
            )
            .field(
                "public_key",
                &self.public_key.as_ref().map(|k| format!("<{} bytes>", k.len())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_private_key() {
        let opts = SshOptions::new("git").private_key(b"super secret".to_vec());
        let debug = format!("{:?}", opts);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("super secret"));
    }

    #[test]
    fn builder_sets_fields() {
        let opts = RemoteOptions::new().ssh(
            SshOptions::new("bob")
                .private_key(b"priv".to_vec())
                .public_key(b"pub".to_vec()),
        );
        let ssh = opts.ssh.unwrap();
        assert_eq!(ssh.user, "bob");
        assert_eq!(ssh.private_key.as_deref(), Some(&b"priv"[..]));
        assert_eq!(ssh.public_key.as_deref(), Some(&b"pub"[..]));
    }
}
