//! Client side of the secure channel factory.

use std::time::Duration;

use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::{client::TlsStream, TlsConnector};
use tracing::info;

use greeter_security::ClientTrust;
use greeter_types::{GreeterError, Result};

use crate::framing;
use crate::identity;
use crate::messages::{HelloRequest, WireMessage};

/// Dial timeout covering both TCP connect and the TLS handshake.
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(6);

/// A client channel to one greeter endpoint, handshaked against the trust
/// configuration it was dialed with.
pub struct GreeterChannel {
    target: String,
    stream: TlsStream<TcpStream>,
}

impl GreeterChannel {
    /// Connect to `target` (a `host:port` string) and complete the TLS
    /// handshake, bounded by [`DIAL_TIMEOUT`].
    ///
    /// Blocks until the handshake completes, fails, or the timeout
    /// elapses. Never retries.
    pub async fn connect(target: &str, trust: &ClientTrust) -> Result<Self> {
        let host = target
            .rsplit_once(':')
            .map(|(host, _)| host)
            .ok_or_else(|| GreeterError::Config(format!("target {} is not host:port", target)))?;
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| GreeterError::Config(format!("invalid server name {}: {}", host, e)))?;

        let connector = TlsConnector::from(trust.config());

        info!("Dialing {}", target);
        let handshake = async {
            let socket = TcpStream::connect(target).await.map_err(|e| {
                GreeterError::Transport(format!("failed to connect to {}: {}", target, e))
            })?;
            connector
                .connect(server_name, socket)
                .await
                .map_err(|e| GreeterError::Handshake(e.to_string()))
        };

        let stream = tokio::time::timeout(DIAL_TIMEOUT, handshake)
            .await
            .map_err(|_| GreeterError::ConnectionTimeout {
                target: target.to_string(),
                seconds: DIAL_TIMEOUT.as_secs(),
            })??;

        let channel = Self {
            target: target.to_string(),
            stream,
        };

        match channel.peer_identity() {
            Some(cn) => info!("Connected to {} ({})", channel.target, cn),
            None => info!("Connected to {}", channel.target),
        }

        Ok(channel)
    }

    /// The verified common name of the server's certificate.
    pub fn peer_identity(&self) -> Option<String> {
        let (_, conn) = self.stream.get_ref();
        let certs = conn.peer_certificates()?;
        identity::common_name(certs.first()?)
    }

    /// Invoke the unary SayHello operation.
    pub async fn say_hello(&mut self, name: &str) -> Result<String> {
        let request = WireMessage::Hello(HelloRequest {
            name: name.to_string(),
        });
        let bytes = request
            .to_bytes()
            .map_err(|e| GreeterError::Rpc(e.to_string()))?;
        framing::write_frame(&mut self.stream, &bytes)
            .await
            .map_err(|e| GreeterError::Transport(e.to_string()))?;

        let frame = framing::read_frame(&mut self.stream)
            .await
            .map_err(|e| GreeterError::Transport(e.to_string()))?;

        match WireMessage::from_bytes(&frame).map_err(|e| GreeterError::Rpc(e.to_string()))? {
            WireMessage::HelloReply(reply) => Ok(reply.message),
            other => Err(GreeterError::Rpc(format!("unexpected reply: {:?}", other))),
        }
    }
}
