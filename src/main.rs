mod cli;
mod config;

use clap::Parser;
use cli::{Cli, Commands};
use config::AppConfig;
use greeter_network::{Endpoint, EndpointManager, GreeterChannel};
use greeter_security::{ClientTrustBuilder, FsCredentialStore, ServerTrustBuilder};
use greeter_types::{AuthMode, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Install default crypto provider for rustls before any TLS operations
    let _ = rustls::crypto::ring::default_provider().install_default();

    if let Err(e) = run().await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_tracing("info");

    let config = AppConfig::load()?;
    let mode = config.auth_mode();
    let store = FsCredentialStore::new(&config.tls.secrets_dir);

    info!("Auth mode: {}", mode);
    info!("Secrets dir: {}", config.tls.secrets_dir);

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => serve(config, mode, store).await,
        Commands::Hello { url, name } => {
            let target = url.unwrap_or_else(|| config.client.target.clone());
            hello(mode, store, &target, &name).await
        }
    }
}

async fn serve(config: AppConfig, mode: AuthMode, store: FsCredentialStore) -> Result<()> {
    let trust = ServerTrustBuilder::new(&store, mode).build().map_err(|e| {
        error!("cannot load TLS credentials: {}", e);
        e
    })?;

    let mut manager = EndpointManager::new();
    manager.add(Endpoint::new(
        config.server.name.clone(),
        config.listen_addr()?,
        trust,
    ));

    manager.serve_all().await
}

async fn hello(mode: AuthMode, store: FsCredentialStore, target: &str, name: &str) -> Result<()> {
    let trust = ClientTrustBuilder::new(&store, mode).build().map_err(|e| {
        error!("cannot load TLS credentials: {}", e);
        e
    })?;

    let mut channel = GreeterChannel::connect(target, &trust).await?;
    info!("Succeeded in connecting to greeter service");

    let message = channel.say_hello(name).await?;
    info!("Greeter responded with: {}", message);
    println!("{}", message);

    Ok(())
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
