//! Telegram Bot API transport: wire types and the HTTP client.

pub mod client;
pub mod error;
pub mod types;

pub use client::TelegramClient;
pub use error::TransportError;
