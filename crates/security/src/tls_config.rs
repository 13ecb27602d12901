//! Trust configuration builders for the client and server roles.
//!
//! Both builders read from a [`CredentialStore`], pin the protocol floor to
//! TLS 1.2 or later, and produce an immutable configuration that every
//! channel of the role shares. A missing or malformed credential fails the
//! build; there is no insecure fallback.

use std::sync::Arc;

use rustls::server::WebPkiClientVerifier;
use rustls::{ClientConfig, ServerConfig, SupportedProtocolVersion};
use tracing::info;

use greeter_types::{AuthMode, GreeterError, Result};

use crate::bundle::CredentialBundle;
use crate::store::{keys, CredentialStore};
use crate::trust::TrustPool;

/// Accepted protocol versions: TLS 1.2 or later.
pub static PROTOCOL_VERSIONS: &[&SupportedProtocolVersion] =
    &[&rustls::version::TLS13, &rustls::version::TLS12];

/// Immutable client-side trust configuration.
///
/// Created once at startup and shared read-only by every channel the
/// client opens.
#[derive(Clone, Debug)]
pub struct ClientTrust {
    mode: AuthMode,
    config: Arc<ClientConfig>,
}

impl ClientTrust {
    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn config(&self) -> Arc<ClientConfig> {
        Arc::clone(&self.config)
    }
}

/// Immutable server-side trust configuration.
#[derive(Clone, Debug)]
pub struct ServerTrust {
    mode: AuthMode,
    config: Arc<ServerConfig>,
}

impl ServerTrust {
    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn config(&self) -> Arc<ServerConfig> {
        Arc::clone(&self.config)
    }
}

/// Builds the client trust configuration.
///
/// Always trusts the root CA for server verification. In mutual mode the
/// client bundle is loaded and presented during the handshake; otherwise
/// the client presents no certificate.
pub struct ClientTrustBuilder<'a> {
    store: &'a dyn CredentialStore,
    mode: AuthMode,
}

impl<'a> ClientTrustBuilder<'a> {
    pub fn new(store: &'a dyn CredentialStore, mode: AuthMode) -> Self {
        Self { store, mode }
    }

    pub fn build(&self) -> Result<ClientTrust> {
        let pool = TrustPool::load(self.store, keys::ROOT_CA_CERT)?;

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = ClientConfig::builder_with_provider(provider)
            .with_protocol_versions(PROTOCOL_VERSIONS)
            .map_err(|e| GreeterError::Config(format!("unsupported protocol versions: {}", e)))?
            .with_root_certificates(pool.into_root_store());

        let config = if self.mode.is_mutual() {
            let bundle =
                CredentialBundle::load(self.store, keys::CLIENT_CERT, keys::CLIENT_KEY)?;
            info!("Using mTLS");
            builder
                .with_client_auth_cert(bundle.cert_chain(), bundle.private_key())
                .map_err(|e| {
                    GreeterError::CredentialLoad(format!("client certificate rejected: {}", e))
                })?
        } else {
            info!("Using server-authenticated TLS");
            builder.with_no_client_auth()
        };

        Ok(ClientTrust {
            mode: self.mode,
            config: Arc::new(config),
        })
    }
}

/// Builds the server trust configuration.
///
/// The server bundle is mandatory. In mutual mode every inbound connection
/// must present a certificate that verifies against the root CA pool;
/// unauthenticated clients are rejected at the handshake layer.
pub struct ServerTrustBuilder<'a> {
    store: &'a dyn CredentialStore,
    mode: AuthMode,
}

impl<'a> ServerTrustBuilder<'a> {
    pub fn new(store: &'a dyn CredentialStore, mode: AuthMode) -> Self {
        Self { store, mode }
    }

    pub fn build(&self) -> Result<ServerTrust> {
        let bundle = CredentialBundle::load(self.store, keys::SERVER_CERT, keys::SERVER_KEY)?;

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = ServerConfig::builder_with_provider(Arc::clone(&provider))
            .with_protocol_versions(PROTOCOL_VERSIONS)
            .map_err(|e| GreeterError::Config(format!("unsupported protocol versions: {}", e)))?;

        let config = if self.mode.is_mutual() {
            let pool = TrustPool::load(self.store, keys::ROOT_CA_CERT)?;
            let verifier =
                WebPkiClientVerifier::builder_with_provider(Arc::new(pool.into_root_store()), provider)
                    .build()
                    .map_err(|e| {
                        GreeterError::CredentialLoad(format!("failed to build client verifier: {}", e))
                    })?;
            info!("Using mTLS");
            builder
                .with_client_cert_verifier(verifier)
                .with_single_cert(bundle.cert_chain(), bundle.private_key())
                .map_err(|e| {
                    GreeterError::CredentialLoad(format!("server certificate rejected: {}", e))
                })?
        } else {
            info!("Using server-authenticated TLS");
            builder
                .with_no_client_auth()
                .with_single_cert(bundle.cert_chain(), bundle.private_key())
                .map_err(|e| {
                    GreeterError::CredentialLoad(format!("server certificate rejected: {}", e))
                })?
        };

        Ok(ServerTrust {
            mode: self.mode,
            config: Arc::new(config),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCredentialStore;
    use rcgen::{
        BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
        KeyUsagePurpose,
    };

    struct TestCa {
        cert: rcgen::Certificate,
        key_pair: KeyPair,
    }

    impl TestCa {
        fn generate() -> Self {
            let mut params = CertificateParams::default();
            let mut dn = DistinguishedName::new();
            dn.push(DnType::CommonName, "Greeter Test CA");
            params.distinguished_name = dn;
            params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
            params.key_usages = vec![
                KeyUsagePurpose::KeyCertSign,
                KeyUsagePurpose::CrlSign,
                KeyUsagePurpose::DigitalSignature,
            ];

            let key_pair = KeyPair::generate().unwrap();
            let cert = params.self_signed(&key_pair).unwrap();
            Self { cert, key_pair }
        }

        fn issue(&self, common_name: &str) -> (String, String) {
            let mut params = CertificateParams::default();
            let mut dn = DistinguishedName::new();
            dn.push(DnType::CommonName, common_name);
            params.distinguished_name = dn;

            let key_pair = KeyPair::generate().unwrap();
            let cert = params
                .signed_by(&key_pair, &self.cert, &self.key_pair)
                .unwrap();
            (cert.pem(), key_pair.serialize_pem())
        }
    }

    fn full_store(ca: &TestCa) -> MemoryCredentialStore {
        let (server_cert, server_key) = ca.issue("greeter-server");
        let (client_cert, client_key) = ca.issue("greeter-client");

        let mut store = MemoryCredentialStore::new();
        store.insert(keys::ROOT_CA_CERT, ca.cert.pem());
        store.insert(keys::SERVER_CERT, server_cert);
        store.insert(keys::SERVER_KEY, server_key);
        store.insert(keys::CLIENT_CERT, client_cert);
        store.insert(keys::CLIENT_KEY, client_key);
        store
    }

    #[test]
    fn client_builds_in_both_modes() {
        let ca = TestCa::generate();
        let store = full_store(&ca);

        let trust = ClientTrustBuilder::new(&store, AuthMode::ServerAuthenticated)
            .build()
            .unwrap();
        assert_eq!(trust.mode(), AuthMode::ServerAuthenticated);

        let trust = ClientTrustBuilder::new(&store, AuthMode::Mutual).build().unwrap();
        assert_eq!(trust.mode(), AuthMode::Mutual);
    }

    #[test]
    fn client_without_root_ca_fails() {
        let store = MemoryCredentialStore::new();
        let err = ClientTrustBuilder::new(&store, AuthMode::ServerAuthenticated)
            .build()
            .unwrap_err();
        assert!(matches!(err, GreeterError::CredentialLoad(_)));
    }

    #[test]
    fn mutual_client_without_bundle_fails() {
        let ca = TestCa::generate();
        let mut store = MemoryCredentialStore::new();
        store.insert(keys::ROOT_CA_CERT, ca.cert.pem());

        // Server-authenticated mode needs no bundle...
        assert!(ClientTrustBuilder::new(&store, AuthMode::ServerAuthenticated)
            .build()
            .is_ok());

        // ...but mutual mode does.
        let err = ClientTrustBuilder::new(&store, AuthMode::Mutual)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains(keys::CLIENT_CERT));
    }

    #[test]
    fn server_builds_in_both_modes() {
        let ca = TestCa::generate();
        let store = full_store(&ca);

        assert!(ServerTrustBuilder::new(&store, AuthMode::ServerAuthenticated)
            .build()
            .is_ok());
        assert!(ServerTrustBuilder::new(&store, AuthMode::Mutual).build().is_ok());
    }

    #[test]
    fn server_without_identity_fails_in_any_mode() {
        let ca = TestCa::generate();
        let mut store = MemoryCredentialStore::new();
        store.insert(keys::ROOT_CA_CERT, ca.cert.pem());

        assert!(ServerTrustBuilder::new(&store, AuthMode::ServerAuthenticated)
            .build()
            .is_err());
        assert!(ServerTrustBuilder::new(&store, AuthMode::Mutual).build().is_err());
    }

    #[test]
    fn mutual_server_without_root_ca_fails() {
        let ca = TestCa::generate();
        let (server_cert, server_key) = ca.issue("greeter-server");
        let mut store = MemoryCredentialStore::new();
        store.insert(keys::SERVER_CERT, server_cert);
        store.insert(keys::SERVER_KEY, server_key);

        // No peer verification requested, so the CA is not needed...
        assert!(ServerTrustBuilder::new(&store, AuthMode::ServerAuthenticated)
            .build()
            .is_ok());

        // ...until mutual mode asks for it.
        let err = ServerTrustBuilder::new(&store, AuthMode::Mutual)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains(keys::ROOT_CA_CERT));
    }
}
