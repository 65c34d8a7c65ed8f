//! Kotoba chat client library.
//!
//! Connects to a conversation endpoint over WebSocket, renders assistant
//! replies and server errors as formatted messages, and sends what the user
//! types.

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod formatter;
pub mod page;
pub mod protocol;
pub mod runner;
pub mod session;
pub mod transport;
pub mod ui;
pub mod view;

pub use client::{ChatClient, ConnectionState, InputEvent, Key};
pub use config::ClientConfig;
pub use runner::run_client;
