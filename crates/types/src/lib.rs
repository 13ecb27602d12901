use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GreeterError {
    #[error("credential load error: {0}")]
    CredentialLoad(String),

    #[error("failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("dial to {target} timed out after {seconds}s")]
    ConnectionTimeout { target: String, seconds: u64 },

    #[error("TLS handshake failed: {0}")]
    Handshake(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rpc protocol error: {0}")]
    Rpc(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Trust mode for a role, decided once at process startup.
///
/// Both the client and server trust builders receive this as an explicit
/// parameter; it is never renegotiated after construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuthMode {
    /// Only the server presents a certificate.
    ServerAuthenticated,
    /// Both sides present and verify certificates (mTLS).
    Mutual,
}

impl AuthMode {
    pub fn from_mutual_flag(mutual: bool) -> Self {
        if mutual {
            AuthMode::Mutual
        } else {
            AuthMode::ServerAuthenticated
        }
    }

    pub fn is_mutual(self) -> bool {
        self == AuthMode::Mutual
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::ServerAuthenticated => write!(f, "server-authenticated TLS"),
            AuthMode::Mutual => write!(f, "mTLS"),
        }
    }
}

pub type Result<T> = std::result::Result<T, GreeterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_from_flag() {
        assert_eq!(AuthMode::from_mutual_flag(true), AuthMode::Mutual);
        assert_eq!(
            AuthMode::from_mutual_flag(false),
            AuthMode::ServerAuthenticated
        );
        assert!(AuthMode::Mutual.is_mutual());
        assert!(!AuthMode::ServerAuthenticated.is_mutual());
    }

    #[test]
    fn errors_name_the_failing_resource() {
        let err = GreeterError::Bind {
            addr: "0.0.0.0:8080".to_string(),
            reason: "address in use".to_string(),
        };
        assert!(err.to_string().contains("0.0.0.0:8080"));

        let err = GreeterError::ConnectionTimeout {
            target: "localhost:8080".to_string(),
            seconds: 6,
        };
        assert!(err.to_string().contains("localhost:8080"));
        assert!(err.to_string().contains("6s"));
    }
}
