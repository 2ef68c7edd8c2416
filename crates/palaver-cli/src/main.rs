use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use palaver_cli::app::{run, AppConfig};
use palaver_cli::transport::SocketClient;

#[derive(Parser)]
#[command(name = "palaver")]
#[command(about = "Headless realtime chat client")]
struct Cli {
    /// Path to the chat server's Unix socket
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Directory for session state (identity, last active chat)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Display name (stored in the session on first run)
    #[arg(long)]
    name: Option<String>,

    /// Avatar URL to attach to the identity
    #[arg(long)]
    avatar: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    palaver_core::tracing_setup::init_tracing();

    let cli = Cli::parse();
    let config = AppConfig {
        socket_path: cli.socket.unwrap_or_else(SocketClient::default_socket_path),
        data_dir: cli.data_dir.unwrap_or_else(default_data_dir),
        display_name: cli.name,
        avatar: cli.avatar,
    };

    run(config).await
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("palaver"))
        .unwrap_or_else(|| PathBuf::from("palaver_data"))
}
