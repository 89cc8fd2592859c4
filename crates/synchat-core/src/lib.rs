//! Core library for synchat
//!
//! - Streaming chat session (SSE-over-fetch decode loop with cancellation
//!   and timeout)
//! - HTTP transport for the chatbot endpoints
//! - Bearer credential storage
//! - Configuration

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;

pub use chat::{Attachment, ChatClient, ChatEvent, OutboundMessage};
pub use config::Config;
pub use error::ChatError;
