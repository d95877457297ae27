//! Conversation domain.
//!
//! - [`entities::Turn`]: one message, made of [`entities::Segment`]s
//! - [`state::ConversationState`]: the seeded, persona-bound turn log

pub mod entities;
pub mod state;
