//! Persona catalogue from TOML (`[personas]` section)
//!
//! ```toml
//! [personas]
//! default = "cat"
//!
//! [[personas.custom]]
//! id = "pirate"
//! display_name = "Pirate"
//! instruction = "Talk like a pirate."
//! opening_reply = "Ahoy!"
//! ```

use persona_chat_domain::{DomainError, Persona, PersonaRegistry};
use serde::{Deserialize, Serialize};

/// Raw personas configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePersonasConfig {
    /// Persona selected at startup; the first registry entry when unset
    pub default: Option<String>,
    /// Added to the builtin presets, or replacing a preset with the same id
    pub custom: Vec<FileCustomPersona>,
}

/// One `[[personas.custom]]` entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCustomPersona {
    pub id: String,
    pub display_name: Option<String>,
    pub instruction: String,
    pub opening_reply: String,
}

impl FileCustomPersona {
    pub fn to_persona(&self) -> Persona {
        let persona = Persona::new(self.id.trim(), self.instruction.clone(), self.opening_reply.clone());
        match &self.display_name {
            Some(name) if !name.trim().is_empty() => persona.with_display_name(name.clone()),
            _ => persona,
        }
    }

    /// Names of required fields left blank
    pub fn blank_fields(&self) -> Vec<&'static str> {
        [
            ("id", &self.id),
            ("instruction", &self.instruction),
            ("opening_reply", &self.opening_reply),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

impl FilePersonasConfig {
    /// Builtin presets merged with the custom entries.
    pub fn build_registry(&self) -> Result<PersonaRegistry, DomainError> {
        PersonaRegistry::builtin()
            .with_overrides(self.custom.iter().map(FileCustomPersona::to_persona).collect())
    }
}
