//! Server side of the secure channel factory.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::{server::TlsStream, TlsAcceptor};
use tracing::{info, warn};

use greeter_security::ServerTrust;
use greeter_types::{GreeterError, Result};

use crate::framing;
use crate::greeter;
use crate::identity;
use crate::messages::WireMessage;

/// A bound greeter listener. Every accepted connection is handshaked
/// against the trust configuration before any RPC frame is read.
pub struct GreeterListener {
    name: String,
    listener: TcpListener,
    acceptor: TlsAcceptor,
}

impl GreeterListener {
    /// Bind the listener socket. Fails if the address is unavailable.
    pub async fn bind(addr: SocketAddr, trust: &ServerTrust, name: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GreeterError::Bind {
                addr: addr.to_string(),
                reason: e.to_string(),
            })?;

        info!("Listening for TCP on {}", addr);

        Ok(Self {
            name: name.to_string(),
            listener,
            acceptor: TlsAcceptor::from(trust.config()),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| GreeterError::Transport(e.to_string()))
    }

    /// Run the accept loop.
    ///
    /// A handshake failure is isolated to its connection; an accept error
    /// is unrecoverable and ends the listener.
    pub async fn serve(self) -> Result<()> {
        loop {
            let (socket, peer_addr) = self.listener.accept().await.map_err(|e| {
                GreeterError::Transport(format!("{}: accept failed: {}", self.name, e))
            })?;

            let acceptor = self.acceptor.clone();
            tokio::spawn(async move {
                match acceptor.accept(socket).await {
                    Ok(stream) => {
                        if let Err(e) = handle_connection(stream, peer_addr).await {
                            warn!("connection from {} ended with error: {}", peer_addr, e);
                        }
                    }
                    Err(e) => warn!("TLS handshake failed from {}: {}", peer_addr, e),
                }
            });
        }
    }
}

async fn handle_connection(
    mut stream: TlsStream<TcpStream>,
    peer_addr: SocketAddr,
) -> Result<()> {
    {
        let (_, conn) = stream.get_ref();
        let peer_cn = conn
            .peer_certificates()
            .and_then(|certs| certs.first())
            .and_then(|cert| identity::common_name(cert));
        if let Some(cn) = peer_cn {
            info!("Verified peer {} connected from {}", cn, peer_addr);
        }
    }

    loop {
        let frame = match framing::read_frame(&mut stream).await {
            Ok(frame) => frame,
            // Peer closed the connection between calls.
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(GreeterError::Transport(e.to_string())),
        };

        match WireMessage::from_bytes(&frame).map_err(|e| GreeterError::Rpc(e.to_string()))? {
            WireMessage::Hello(request) => {
                let reply = WireMessage::HelloReply(greeter::say_hello(&request));
                let bytes = reply
                    .to_bytes()
                    .map_err(|e| GreeterError::Rpc(e.to_string()))?;
                framing::write_frame(&mut stream, &bytes)
                    .await
                    .map_err(|e| GreeterError::Transport(e.to_string()))?;
            }
            other => {
                warn!("unexpected message from {}: {:?}", peer_addr, other);
            }
        }
    }
}
