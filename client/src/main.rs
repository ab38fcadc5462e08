use clap::Parser;
use client::network::Client;
use log::{error, info};
use macroquad::window::Conf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Window width
    #[arg(short = 'w', long, default_value = "800")]
    width: usize,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "600")]
    height: usize,
}

fn window_conf() -> Conf {
    let args = Args::parse();
    Conf {
        window_title: "Animal Tic-Tac-Toe".to_string(),
        window_width: args.width as i32,
        window_height: args.height as i32,
        window_resizable: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    info!("Controls: click or press 1-9 to move, R to reset, Esc to quit");

    let mut client = match Client::new(&args.server, args.width, args.height) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to start client: {}", e);
            return;
        }
    };

    if let Err(e) = client.run().await {
        error!("Client stopped with error: {}", e);
    }
}
