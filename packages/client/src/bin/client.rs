//! Terminal chat client for a single conversation.
//!
//! Connects to `<ws|wss>://<host>/ws/chat/<conversation_id>/`, shows assistant
//! replies and server errors, and sends each line typed at the prompt.
//! The connection is opened once; there is no reconnection.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kotoba-client -- --origin https://chat.example.com --conversation-id 3f2a6c1e
//! cargo run --bin kotoba-client -- --page http://127.0.0.1:8000/chat/3f2a6c1e/
//! cargo run --bin kotoba-client -- --transcript chat.html
//! ```

use std::path::PathBuf;

use clap::Parser;

use kotoba_client::{ClientConfig, config::DEFAULT_ORIGIN, run_client};
use kotoba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "kotoba-client")]
#[command(about = "Terminal chat client for a Kotoba conversation", long_about = None)]
struct Args {
    /// Page origin; https selects a secure socket
    #[arg(short = 'o', long, default_value = DEFAULT_ORIGIN, conflicts_with = "page")]
    origin: String,

    /// Conversation to join (a new one is started when omitted)
    #[arg(short = 'c', long, conflicts_with = "page")]
    conversation_id: Option<String>,

    /// Chat page URL to read the origin and conversation from
    #[arg(short = 'p', long)]
    page: Option<String>,

    /// Keep an HTML transcript of the conversation at this path
    #[arg(short = 't', long)]
    transcript: Option<PathBuf>,

    /// Height of the scroll viewport in rows
    #[arg(long)]
    viewport: Option<usize>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(&[env!("CARGO_PKG_NAME")], "info");

    let args = Args::parse();

    let config = match ClientConfig::new(
        &args.origin,
        args.conversation_id,
        args.page,
        args.transcript,
        args.viewport,
    ) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
