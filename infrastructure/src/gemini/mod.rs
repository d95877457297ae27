//! Google Gemini adapter
//!
//! Implements the [`CompletionGateway`](persona_chat_application::CompletionGateway)
//! port over the `generateContent` REST endpoint.

pub mod error;
pub mod gateway;
pub mod protocol;

pub use gateway::{GeminiGateway, GeminiSettings};
