use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "greeter-mtls")]
#[command(version, about = "TLS/mTLS greeter demo: secure RPC server and client", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the greeter server
    Serve,

    /// Call SayHello on a running greeter server
    Hello {
        #[arg(short, long, help = "URI for the greeter service")]
        url: Option<String>,

        #[arg(short, long, default_value = "Rust client", help = "Name to greet")]
        name: String,
    },
}
