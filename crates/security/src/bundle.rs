//! Credential bundle loading.

use std::io::Cursor;

use rustls::crypto::KeyProvider as _;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::sign::SigningKey as _;

use greeter_types::{GreeterError, Result};

use crate::store::CredentialStore;

/// A certificate chain and its matching private key, owned by the role
/// that presents it. Immutable once loaded; a pair that does not match
/// never becomes a bundle.
#[derive(Debug)]
pub struct CredentialBundle {
    cert_chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

impl CredentialBundle {
    /// Load certificate and key material from the store.
    ///
    /// Fails with [`GreeterError::CredentialLoad`] if either credential is
    /// absent, unparseable, or the certificate's public key does not match
    /// the private key.
    pub fn load(store: &dyn CredentialStore, cert_key: &str, key_key: &str) -> Result<Self> {
        let cert_pem = store.read(cert_key)?;
        let key_pem = store.read(key_key)?;

        let cert_chain = parse_cert_chain(&cert_pem, cert_key)?;
        let key = parse_private_key(&key_pem, key_key)?;

        verify_key_matches_leaf(&cert_chain[0], &key)?;

        Ok(Self { cert_chain, key })
    }

    pub fn cert_chain(&self) -> Vec<CertificateDer<'static>> {
        self.cert_chain.clone()
    }

    pub fn private_key(&self) -> PrivateKeyDer<'static> {
        self.key.clone_key()
    }
}

/// Parse a PEM certificate chain; zero certificates is a hard failure.
pub(crate) fn parse_cert_chain(pem: &[u8], name: &str) -> Result<Vec<CertificateDer<'static>>> {
    let mut reader = Cursor::new(pem);
    let certs: Vec<CertificateDer> = rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| {
            GreeterError::CredentialLoad(format!("failed to parse certificates from {}: {}", name, e))
        })?;

    if certs.is_empty() {
        return Err(GreeterError::CredentialLoad(format!(
            "no certificates found in {}",
            name
        )));
    }

    Ok(certs)
}

fn parse_private_key(pem: &[u8], name: &str) -> Result<PrivateKeyDer<'static>> {
    // Try PKCS#8 first
    let mut reader = Cursor::new(pem);
    if let Some(key) = rustls_pemfile::pkcs8_private_keys(&mut reader)
        .next()
        .transpose()
        .map_err(|e| {
            GreeterError::CredentialLoad(format!("failed to parse PKCS8 key from {}: {}", name, e))
        })?
    {
        return Ok(PrivateKeyDer::Pkcs8(key));
    }

    // Then PKCS#1 (RSA)
    let mut reader = Cursor::new(pem);
    if let Some(key) = rustls_pemfile::rsa_private_keys(&mut reader)
        .next()
        .transpose()
        .map_err(|e| {
            GreeterError::CredentialLoad(format!("failed to parse RSA key from {}: {}", name, e))
        })?
    {
        return Ok(PrivateKeyDer::Pkcs1(key));
    }

    Err(GreeterError::CredentialLoad(format!(
        "no private key found in {}",
        name
    )))
}

/// Reject a bundle whose leaf certificate was not issued for this key.
///
/// Compares the certificate's SubjectPublicKeyInfo with the public half the
/// crypto provider derives from the private key. Providers that cannot
/// expose the public key skip the check; rustls repeats it when the bundle
/// is installed into a config.
fn verify_key_matches_leaf(
    leaf: &CertificateDer<'static>,
    key: &PrivateKeyDer<'static>,
) -> Result<()> {
    use x509_parser::prelude::*;

    let provider = rustls::crypto::ring::default_provider();
    let signing_key = provider
        .key_provider
        .load_private_key(key.clone_key())
        .map_err(|e| GreeterError::CredentialLoad(format!("unusable private key: {}", e)))?;

    let Some(key_spki) = signing_key.public_key() else {
        return Ok(());
    };

    let (_, cert) = X509Certificate::from_der(leaf.as_ref())
        .map_err(|e| GreeterError::CredentialLoad(format!("failed to parse certificate: {}", e)))?;

    if cert.public_key().raw != key_spki.as_ref() {
        return Err(GreeterError::CredentialLoad(
            "certificate public key does not match private key".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCredentialStore;
    use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};

    const CERT: &str = "test/cert.pem";
    const KEY: &str = "test/key.pem";

    fn self_signed(common_name: &str) -> (String, String) {
        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, common_name);
        params.distinguished_name = dn;

        let key_pair = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key_pair).unwrap();
        (cert.pem(), key_pair.serialize_pem())
    }

    fn store_with(cert_pem: &str, key_pem: &str) -> MemoryCredentialStore {
        let mut store = MemoryCredentialStore::new();
        store.insert(CERT, cert_pem.as_bytes().to_vec());
        store.insert(KEY, key_pem.as_bytes().to_vec());
        store
    }

    #[test]
    fn matching_pair_loads() {
        let (cert_pem, key_pem) = self_signed("bundle-test");
        let store = store_with(&cert_pem, &key_pem);

        let bundle = CredentialBundle::load(&store, CERT, KEY).unwrap();
        assert_eq!(bundle.cert_chain().len(), 1);
    }

    #[test]
    fn mismatched_pair_is_rejected() {
        let (cert_pem, _) = self_signed("pair-a");
        let (_, other_key_pem) = self_signed("pair-b");
        let store = store_with(&cert_pem, &other_key_pem);

        let err = CredentialBundle::load(&store, CERT, KEY).unwrap_err();
        assert!(matches!(err, GreeterError::CredentialLoad(_)));
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn garbage_certificate_is_rejected() {
        let (_, key_pem) = self_signed("garbage-test");
        let store = store_with("not a certificate", &key_pem);

        assert!(CredentialBundle::load(&store, CERT, KEY).is_err());
    }

    #[test]
    fn garbage_key_is_rejected() {
        let (cert_pem, _) = self_signed("garbage-test");
        let store = store_with(&cert_pem, "not a key");

        let err = CredentialBundle::load(&store, CERT, KEY).unwrap_err();
        assert!(err.to_string().contains(KEY));
    }

    #[test]
    fn missing_credential_is_rejected() {
        let store = MemoryCredentialStore::new();
        assert!(CredentialBundle::load(&store, CERT, KEY).is_err());
    }
}
