//! Anthropic Messages API: the client that grades answers and the key it uses

pub mod auth;
pub mod client;
pub mod error;
pub mod models;

pub use auth::{ApiKeyManager, KeySource};
pub use client::ClaudeClient;
pub use error::ClaudeError;
pub use models::{ClaudeModel, CreateMessageRequest, Message, MessageResponse};
