//! Persona entities

use serde::{Deserialize, Serialize};

/// Unique identity of a persona (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonaId(String);

impl PersonaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PersonaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PersonaId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PersonaId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for PersonaId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// A named behavioral profile (Entity)
///
/// The hidden instruction is injected as the first context entry of every
/// conversation and never rendered; the opening reply is the first turn the
/// user sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    id: PersonaId,
    display_name: String,
    instruction: String,
    opening_reply: String,
}

impl Persona {
    pub fn new(
        id: impl Into<PersonaId>,
        instruction: impl Into<String>,
        opening_reply: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            display_name: id.as_str().to_string(),
            id,
            instruction: instruction.into(),
            opening_reply: opening_reply.into(),
        }
    }

    /// Set a human-readable name shown in persona listings
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn id(&self) -> &PersonaId {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn opening_reply(&self) -> &str {
        &self.opening_reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_defaults_to_id() {
        let persona = Persona::new("wizard", "Be terse.", "...Yes?");
        assert_eq!(persona.display_name(), "wizard");
        assert_eq!(persona.id(), "wizard");
    }

    #[test]
    fn test_with_display_name() {
        let persona = Persona::new("wizard", "Be terse.", "...Yes?").with_display_name("Cool Wizard");
        assert_eq!(persona.display_name(), "Cool Wizard");
        assert_eq!(persona.id().as_str(), "wizard");
    }

    #[test]
    fn test_persona_id_serde_transparent() {
        let id = PersonaId::new("cat");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"cat\"");
        let back: PersonaId = serde_json::from_str("\"cat\"").unwrap();
        assert_eq!(back, id);
    }
}
