use clap::Parser;
use log::info;
use server::config::{RejectionPolicy, ServerConfig};
use server::game::Session;
use server::network::Server;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Maximum number of registered connections
    #[arg(short, long, default_value = "16")]
    max_connections: usize,

    /// Seconds of silence before a client counts as disconnected
    #[arg(short = 't', long, default_value = "5")]
    client_timeout_secs: u64,

    /// Tell clients why a request was ignored instead of dropping it silently
    #[arg(long)]
    notify_rejections: bool,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            host: args.host,
            port: args.port,
            max_connections: args.max_connections,
            client_timeout: Duration::from_secs(args.client_timeout_secs),
            rejection_policy: if args.notify_rejections {
                RejectionPolicy::Notify
            } else {
                RejectionPolicy::Silent
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let config = ServerConfig::from(Args::parse());
    info!("Starting server with {:?}", config);

    let mut server = Server::new(&config, Session::new()).await?;

    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down gracefully...");
            shutdown.shutdown();
        }
    });

    server.run().await?;

    Ok(())
}
