// ABOUTME: Read-only registry of trusted SSH host keys from known_hosts files.
// ABOUTME: Loaded once per process from the system-wide and per-user files.

use super::fingerprint::{Fingerprint, HashKind};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

const HASH_HOSTNAME_PREFIX: &str = "|1|";

static STANDARD_KNOWN_HOSTS: OnceLock<Arc<KnownHosts>> = OnceLock::new();

/// Where a trusted key was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: PathBuf,
    pub line: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} line {}", self.path.display(), self.line)
    }
}

/// A trusted public key in SSH wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostKey {
    /// Key type as written in the file, e.g. `ssh-ed25519`.
    pub algorithm: String,
    /// Decoded key blob.
    pub blob: Vec<u8>,
    pub location: Location,
}

impl HostKey {
    pub fn fingerprint(&self, kind: HashKind) -> Fingerprint {
        Fingerprint::compute(kind, &self.blob)
    }
}

/// Host side of a known_hosts line.
#[derive(Debug, Clone)]
enum HostPattern {
    /// `|1|salt|hash`, matched with HMAC-SHA1.
    Hashed { salt: Vec<u8>, hash: Vec<u8> },
    /// Comma-separated patterns; `allow` may contain `*` and `?`.
    List { allow: Vec<String>, deny: Vec<String> },
}

impl HostPattern {
    fn parse(field: &str) -> Option<Self> {
        if let Some(hashed) = field.strip_prefix(HASH_HOSTNAME_PREFIX) {
            let (salt, hash) = hashed.split_once('|')?;
            return Some(HostPattern::Hashed {
                salt: STANDARD.decode(salt).ok()?,
                hash: STANDARD.decode(hash).ok()?,
            });
        }

        let mut allow = Vec::new();
        let mut deny = Vec::new();
        for pattern in field.split(',').filter(|p| !p.is_empty()) {
            let pattern = pattern.to_lowercase();
            match pattern.strip_prefix('!') {
                Some(negated) => deny.push(negated.to_string()),
                None => allow.push(pattern),
            }
        }
        if allow.is_empty() {
            return None;
        }
        Some(HostPattern::List { allow, deny })
    }

    fn matches(&self, host: &str) -> bool {
        match self {
            HostPattern::Hashed { salt, hash } => {
                let Ok(mut mac) = Hmac::<Sha1>::new_from_slice(salt) else {
                    return false;
                };
                mac.update(host.as_bytes());
                mac.verify_slice(hash).is_ok()
            }
            HostPattern::List { allow, deny } => {
                if deny.iter().any(|p| wildcard_match(p, host)) {
                    return false;
                }
                allow.iter().any(|p| wildcard_match(p, host))
            }
        }
    }

    /// Literal hostnames this pattern can be indexed under, if it has no
    /// wildcards, hashes or negations.
    fn literal_hosts(&self) -> Option<&[String]> {
        match self {
            HostPattern::List { allow, deny }
                if deny.is_empty() && !allow.iter().any(|p| p.contains(['*', '?'])) =>
            {
                Some(allow)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    hosts: HostPattern,
    key: HostKey,
}

enum LineKind {
    Key,
    Revoked,
}

/// Trusted host keys indexed by hostname.
///
/// Lines that cannot be indexed by a literal hostname (hashed names,
/// wildcards, negations) are kept aside and matched on lookup.
#[derive(Debug, Default, Clone)]
pub struct KnownHosts {
    by_host: HashMap<String, Vec<HostKey>>,
    scanned: Vec<Entry>,
    revoked: Vec<Entry>,
}

impl KnownHosts {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry built from [`KnownHosts::standard_paths`].
    ///
    /// Loaded at most once. If no file is readable the registry is empty and
    /// every host fails verification.
    pub fn standard() -> Arc<KnownHosts> {
        Arc::clone(STANDARD_KNOWN_HOSTS.get_or_init(|| {
            let known_hosts = KnownHosts::load(&KnownHosts::standard_paths());
            if known_hosts.is_empty() {
                tracing::warn!(
                    "no SSH known_hosts entries could be read; SSH host key checking will fail"
                );
            }
            Arc::new(known_hosts)
        }))
    }

    /// System-wide known_hosts followed by the user's `~/.ssh/known_hosts`.
    pub fn standard_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if cfg!(unix) {
            paths.push(PathBuf::from("/etc/ssh/ssh_known_hosts"));
        } else if cfg!(windows)
            && let Some(program_data) = std::env::var_os("ProgramData")
        {
            paths.push(PathBuf::from(program_data).join("ssh").join("ssh_known_hosts"));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".ssh").join("known_hosts"));
        }
        paths
    }

    /// Load and merge the given files. Unreadable files are skipped.
    pub fn load(paths: &[PathBuf]) -> Self {
        let mut known_hosts = KnownHosts::new();
        for path in paths {
            match std::fs::read_to_string(path) {
                Ok(contents) => known_hosts.merge(KnownHosts::parse(path, &contents)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!("known_hosts file {} does not exist", path.display());
                }
                Err(e) => {
                    tracing::warn!("failed to read known_hosts file {}: {}", path.display(), e);
                }
            }
        }
        known_hosts
    }

    /// Parse known_hosts text. Malformed lines are skipped.
    pub fn parse(path: &Path, contents: &str) -> Self {
        let mut known_hosts = KnownHosts::new();
        for (index, line) in contents.lines().enumerate() {
            let location = Location {
                path: path.to_path_buf(),
                line: index + 1,
            };
            match parse_line(line, location) {
                Some((LineKind::Key, entry)) => known_hosts.insert(entry),
                Some((LineKind::Revoked, entry)) => known_hosts.revoked.push(entry),
                None => {}
            }
        }
        known_hosts
    }

    fn insert(&mut self, entry: Entry) {
        match entry.hosts.literal_hosts() {
            Some(hosts) => {
                for host in hosts {
                    self.by_host
                        .entry(host.clone())
                        .or_default()
                        .push(entry.key.clone());
                }
            }
            None => self.scanned.push(entry),
        }
    }

    /// Add every entry of `other`. Keys for the same host accumulate.
    pub fn merge(&mut self, other: KnownHosts) {
        for (host, keys) in other.by_host {
            self.by_host.entry(host).or_default().extend(keys);
        }
        self.scanned.extend(other.scanned);
        self.revoked.extend(other.revoked);
    }

    /// Trusted keys for `host`, or `None` if the host is unknown.
    pub fn lookup(&self, host: &str) -> Option<Vec<&HostKey>> {
        let host = host.to_lowercase();
        let mut keys: Vec<&HostKey> = self
            .by_host
            .get(&host)
            .map(|keys| keys.iter().collect())
            .unwrap_or_default();
        keys.extend(
            self.scanned
                .iter()
                .filter(|entry| entry.hosts.matches(&host))
                .map(|entry| &entry.key),
        );
        if keys.is_empty() { None } else { Some(keys) }
    }

    /// Keys explicitly marked `@revoked` for `host`.
    pub fn revoked(&self, host: &str) -> Vec<&HostKey> {
        let host = host.to_lowercase();
        self.revoked
            .iter()
            .filter(|entry| entry.hosts.matches(&host))
            .map(|entry| &entry.key)
            .collect()
    }

    /// Number of trusted key entries (revocations excluded).
    pub fn len(&self) -> usize {
        self.by_host.values().map(Vec::len).sum::<usize>() + self.scanned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_line(line: &str, location: Location) -> Option<(LineKind, Entry)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let mut parts = line.split([' ', '\t']).filter(|s| !s.is_empty());

    let kind = if line.starts_with('@') {
        match parts.next()? {
            "@revoked" => LineKind::Revoked,
            marker => {
                // @cert-authority and unknown markers are not supported.
                tracing::debug!("skipping {} line at {}", marker, location);
                return None;
            }
        }
    } else {
        LineKind::Key
    };

    let Some(hosts) = parts.next().and_then(HostPattern::parse) else {
        tracing::debug!("skipping malformed known_hosts line at {}", location);
        return None;
    };
    let algorithm = parts.next()?;
    let Some(blob) = parts.next().and_then(|b| STANDARD.decode(b).ok()) else {
        tracing::debug!("skipping known_hosts line with bad key at {}", location);
        return None;
    };

    Some((
        kind,
        Entry {
            hosts,
            key: HostKey {
                algorithm: algorithm.to_string(),
                blob,
                location,
            },
        },
    ))
}

/// OpenSSH-style pattern match supporting `*` and `?`.
fn wildcard_match(pattern: &str, host: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let host: Vec<char> = host.chars().collect();
    let (mut p, mut h) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while h < host.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == host[h]) {
            p += 1;
            h += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, h));
            p += 1;
        } else if let Some((star_p, star_h)) = backtrack {
            p = star_p + 1;
            h = star_h + 1;
            backtrack = Some((star_p, star_h + 1));
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}
