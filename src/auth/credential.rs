// ABOUTME: Chooses the username and key pair presented to the remote.
// ABOUTME: Declines politely when no usable credential exists for a URL.

use std::path::PathBuf;

/// Credential kinds the transfer engine is willing to accept right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllowedCredentials {
    pub ssh_key: bool,
    pub username: bool,
}

impl AllowedCredentials {
    pub const SSH_KEY: Self = Self {
        ssh_key: true,
        username: false,
    };

    pub const USERNAME: Self = Self {
        ssh_key: false,
        username: true,
    };
}

/// Credential descriptor handed back to the transfer engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Key-based authentication with staged key files.
    SshKey {
        username: String,
        public_key: PathBuf,
        private_key: PathBuf,
        /// Always empty; staged keys are unencrypted.
        passphrase: String,
    },
    /// Username only, requested before the engine picks a method.
    Username(String),
    /// Nothing usable for this request.
    Unavailable,
}

/// Paths of the staged private and public key files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPaths {
    pub private_key: PathBuf,
    pub public_key: PathBuf,
}

/// Picks credentials for one operation.
#[derive(Debug, Clone)]
pub struct CredentialSelector {
    user: String,
    keys: Option<KeyPaths>,
}

impl CredentialSelector {
    pub fn new(user: impl Into<String>, keys: Option<KeyPaths>) -> Self {
        Self {
            user: user.into(),
            keys,
        }
    }

    /// Username from the URL, else the configured user, else the login name.
    pub fn username(&self, username_from_url: Option<&str>) -> String {
        match username_from_url {
            Some(name) if !name.is_empty() => name.to_string(),
            _ if !self.user.is_empty() => self.user.clone(),
            _ => whoami::username(),
        }
    }

    pub fn select(
        &self,
        url: &str,
        username_from_url: Option<&str>,
        allowed: AllowedCredentials,
    ) -> Credential {
        if allowed.ssh_key
            && let Some(keys) = &self.keys
        {
            return Credential::SshKey {
                username: self.username(username_from_url),
                public_key: keys.public_key.clone(),
                private_key: keys.private_key.clone(),
                passphrase: String::new(),
            };
        }

        if allowed.username {
            return Credential::Username(self.username(username_from_url));
        }

        tracing::warn!("no authentication available for git URL {:?}", url);
        Credential::Unavailable
    }
}
