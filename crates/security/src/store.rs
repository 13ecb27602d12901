//! Credential store access.
//!
//! Trust building only ever needs "read the bytes stored under a key"; the
//! [`CredentialStore`] trait captures exactly that, so tests can substitute
//! an in-memory store without touching any trust logic.

use std::collections::HashMap;
use std::path::PathBuf;

use greeter_types::{GreeterError, Result};

/// Read-bytes-by-key access to certificate and key material.
pub trait CredentialStore: Send + Sync {
    /// Read the credential stored under `key`.
    ///
    /// Fails with [`GreeterError::CredentialLoad`] if the credential is
    /// absent or unreadable.
    fn read(&self, key: &str) -> Result<Vec<u8>>;
}

/// Well-known credential keys.
///
/// These mirror the layout of the secret mount the demo deploys with: one
/// subtree per role, public certificates separated from private keys.
pub mod keys {
    /// Root CA certificate used to validate the peer's chain.
    pub const ROOT_CA_CERT: &str = "root/public/ca.cert";

    /// Server certificate presented to clients.
    pub const SERVER_CERT: &str = "server/public/service.pem";
    /// Server private key.
    pub const SERVER_KEY: &str = "server/private/service.key";

    /// Client certificate presented to servers in mutual mode.
    pub const CLIENT_CERT: &str = "client/public/service.pem";
    /// Client private key.
    pub const CLIENT_KEY: &str = "client/private/service.key";
}

/// Default location of the credential mount.
pub const DEFAULT_SECRETS_DIR: &str = "/secrets";

/// Filesystem-backed credential store rooted at a directory.
pub struct FsCredentialStore {
    root: PathBuf,
}

impl FsCredentialStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl CredentialStore for FsCredentialStore {
    fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.root.join(key);
        std::fs::read(&path).map_err(|e| {
            GreeterError::CredentialLoad(format!("failed to read {}: {}", path.display(), e))
        })
    }
}

/// In-memory credential store for tests.
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(key.into(), bytes.into());
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn read(&self, key: &str) -> Result<Vec<u8>> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| GreeterError::CredentialLoad(format!("no credential stored under {}", key)))
    }
}
