//! Domain layer for persona-chat
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Persona
//!
//! A persona is a hidden instruction plus a scripted opening reply. The
//! [`PersonaRegistry`] is fixed at start-up.
//!
//! ## Conversation
//!
//! A [`ConversationState`] is a linear log of [`Turn`]s seeded with the
//! persona's hidden instruction. Selecting a different persona throws the
//! whole log away and starts over.
//!
//! ## Session token
//!
//! [`SessionCodec`] turns a conversation into a copy/paste-able hex token and
//! back.

pub mod conversation;
pub mod core;
pub mod persona;
pub mod session;

// Re-export commonly used types
pub use conversation::{
    entities::{Attachment, AttachmentData, Role, Segment, Turn},
    state::{ContextEntry, ConversationState},
};
pub use core::{error::DomainError, text::preview};
pub use persona::{
    entities::{Persona, PersonaId},
    registry::PersonaRegistry,
};
pub use session::codec::{CodecError, SavedSession, SessionCodec};
