pub mod bundle;
pub mod store;
pub mod tls_config;
pub mod trust;

pub use bundle::CredentialBundle;
pub use store::{keys, CredentialStore, FsCredentialStore, MemoryCredentialStore};
pub use tls_config::{
    ClientTrust, ClientTrustBuilder, ServerTrust, ServerTrustBuilder, PROTOCOL_VERSIONS,
};
pub use trust::TrustPool;
