use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use greeter_types::{AuthMode, GreeterError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub tls: TlsConfig,
    pub server: ServerConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    pub mutual: bool,
    pub secrets_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub target: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        // Create default config structure
        let mut app_config = AppConfig {
            tls: TlsConfig {
                mutual: false,
                secrets_dir: greeter_security::store::DEFAULT_SECRETS_DIR.to_string(),
            },
            server: ServerConfig {
                listen_addr: "0.0.0.0:8080".to_string(),
                name: "Greeter Service".to_string(),
            },
            client: ClientConfig {
                target: "localhost:8080".to_string(),
            },
        };

        // Try to load from file if exists
        if Path::new("config/default.toml").exists() {
            let settings = config::Config::builder()
                .add_source(config::File::with_name("config/default"))
                .build()
                .map_err(|e| GreeterError::Config(format!("failed to load config file: {}", e)))?;

            if let Ok(file_config) = settings.try_deserialize::<AppConfig>() {
                app_config = file_config;
            }
        }

        // Override with environment variables
        Self::override_from_env(&mut app_config)?;

        Ok(app_config)
    }

    fn override_from_env(config: &mut AppConfig) -> Result<()> {
        if let Ok(use_mtls) = std::env::var("USE_MTLS") {
            config.tls.mutual = use_mtls
                .parse()
                .map_err(|e| GreeterError::Config(format!("invalid USE_MTLS: {}", e)))?;
        }

        if let Ok(secrets_dir) = std::env::var("SECRETS_DIR") {
            config.tls.secrets_dir = secrets_dir;
        }

        if let Ok(listen_addr) = std::env::var("LISTEN_ADDR") {
            config.server.listen_addr = listen_addr;
        }

        if let Ok(target) = std::env::var("GREETER_URL") {
            config.client.target = target;
        }

        Ok(())
    }

    /// The trust mode both roles are built with, decided once per process.
    pub fn auth_mode(&self) -> AuthMode {
        AuthMode::from_mutual_flag(self.tls.mutual)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server
            .listen_addr
            .parse()
            .map_err(|e| GreeterError::Config(format!("invalid listen_addr: {}", e)))
    }
}
