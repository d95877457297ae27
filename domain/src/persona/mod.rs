//! Persona domain.
//!
//! - [`entities::Persona`]: a hidden instruction plus a scripted opening line
//! - [`registry::PersonaRegistry`]: the read-only table of available personas

pub mod entities;
pub mod presets;
pub mod registry;
