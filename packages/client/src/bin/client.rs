//! Terminal chat-room client.
//!
//! Asks for a username and a room number, then shows the room's messages as
//! they arrive and sends every typed line to the room.
//! `/leave` goes back to the username prompt, `/quit` (or Ctrl+D) exits.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba
//! cargo run --bin hiroba -- --base-url http://127.0.0.1:8080 --session-file session.json
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use hiroba_client::config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_VIEWPORT_HEIGHT};
use hiroba_client::transport::{MAX_RECONNECT_ATTEMPTS, RECONNECT_INTERVAL};
use hiroba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroba")]
#[command(about = "Terminal chat-room client following a room's event stream", long_about = None)]
struct Args {
    /// Chat server base URL
    #[arg(short = 'u', long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Keep the session (identity and messages) in this file across restarts
    #[arg(short = 's', long)]
    session_file: Option<PathBuf>,

    /// Number of transcript lines shown when scrolling
    #[arg(long, default_value_t = DEFAULT_VIEWPORT_HEIGHT)]
    height: usize,

    /// Consecutive failed attempts before giving up on the event stream
    #[arg(long, default_value_t = MAX_RECONNECT_ATTEMPTS)]
    max_reconnect_attempts: u32,

    /// Delay between reconnection attempts, unless the server sets one
    #[arg(long, default_value_t = RECONNECT_INTERVAL.as_millis() as u64)]
    reconnect_interval_ms: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(&[env!("CARGO_PKG_NAME"), env!("CARGO_BIN_NAME")], "warn");

    let args = Args::parse();
    let config = ClientConfig {
        base_url: args.base_url,
        session_file: args.session_file,
        viewport_height: args.height,
        ..ClientConfig::default()
    }
    .with_reconnect(
        args.max_reconnect_attempts,
        Duration::from_millis(args.reconnect_interval_ms),
    );

    if let Err(e) = hiroba_client::runner::run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
