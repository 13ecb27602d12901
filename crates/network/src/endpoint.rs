//! Endpoint lifecycle management.

use std::net::SocketAddr;

use tokio::task::JoinSet;
use tracing::info;

use greeter_security::ServerTrust;
use greeter_types::{GreeterError, Result};

use crate::listener::GreeterListener;

/// One served network address with its own trust configuration.
pub struct Endpoint {
    name: String,
    addr: SocketAddr,
    trust: ServerTrust,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, addr: SocketAddr, trust: ServerTrust) -> Self {
        Self {
            name: name.into(),
            addr,
            trust,
        }
    }
}

/// Supervises the listeners and blocks until all of them have stopped.
///
/// There is no graceful per-endpoint shutdown: the first endpoint to fail
/// ends the whole run.
#[derive(Default)]
pub struct EndpointManager {
    endpoints: Vec<Endpoint>,
}

impl EndpointManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, endpoint: Endpoint) {
        self.endpoints.push(endpoint);
    }

    /// Bind every endpoint, then serve all of them concurrently until the
    /// first fatal error.
    pub async fn serve_all(self) -> Result<()> {
        let mut tasks = JoinSet::new();

        for endpoint in self.endpoints {
            let listener =
                GreeterListener::bind(endpoint.addr, &endpoint.trust, &endpoint.name).await?;
            info!("Starting {}", endpoint.name);
            tasks.spawn(listener.serve());
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(e),
                Err(e) => {
                    return Err(GreeterError::Transport(format!("endpoint task failed: {}", e)))
                }
            }
        }

        Ok(())
    }
}
