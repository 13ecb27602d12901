//! Trust pool construction.

use rustls::RootCertStore;

use greeter_types::{GreeterError, Result};

use crate::bundle::parse_cert_chain;
use crate::store::CredentialStore;

/// Root certificates used to validate a peer's chain.
///
/// Construction fails unless at least one root parses and is accepted; an
/// empty pool never means "trust everything".
#[derive(Debug)]
pub struct TrustPool {
    roots: RootCertStore,
}

impl TrustPool {
    /// Build a pool from one or more PEM-encoded root certificates.
    pub fn from_pem(pem: &[u8], name: &str) -> Result<Self> {
        let certs = parse_cert_chain(pem, name)?;

        let mut roots = RootCertStore::empty();
        for cert in certs {
            roots.add(cert).map_err(|e| {
                GreeterError::CredentialLoad(format!(
                    "failed to add root certificate from {}: {}",
                    name, e
                ))
            })?;
        }

        if roots.is_empty() {
            return Err(GreeterError::CredentialLoad(format!(
                "no usable root certificates in {}",
                name
            )));
        }

        Ok(Self { roots })
    }

    /// Load the pool from the credential store.
    pub fn load(store: &dyn CredentialStore, key: &str) -> Result<Self> {
        let pem = store.read(key)?;
        Self::from_pem(&pem, key)
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub(crate) fn into_root_store(self) -> RootCertStore {
        self.roots
    }
}
