//! Persona registry

use super::entities::{Persona, PersonaId};
use super::presets::builtin_personas;
use crate::core::error::DomainError;

/// Read-only, ordered table of personas.
///
/// Built once at start-up (builtins plus any configured overrides) and shared
/// immutably afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaRegistry {
    personas: Vec<Persona>,
}

impl PersonaRegistry {
    /// Build a registry, rejecting an empty table and duplicate identities.
    pub fn new(personas: Vec<Persona>) -> Result<Self, DomainError> {
        if personas.is_empty() {
            return Err(DomainError::NoPersonas);
        }
        for (i, persona) in personas.iter().enumerate() {
            if personas[..i].iter().any(|p| p.id() == persona.id()) {
                return Err(DomainError::DuplicatePersona(persona.id().to_string()));
            }
        }
        Ok(Self { personas })
    }

    /// Registry holding the built-in presets
    pub fn builtin() -> Self {
        Self {
            personas: builtin_personas(),
        }
    }

    /// Add personas, replacing any existing entry with the same identity in place.
    ///
    /// New identities are appended in the order given.
    pub fn with_overrides(mut self, custom: Vec<Persona>) -> Result<Self, DomainError> {
        let mut seen: Vec<PersonaId> = Vec::new();
        for persona in custom {
            if seen.contains(persona.id()) {
                return Err(DomainError::DuplicatePersona(persona.id().to_string()));
            }
            seen.push(persona.id().clone());

            match self.personas.iter_mut().find(|p| p.id() == persona.id()) {
                Some(slot) => *slot = persona,
                None => self.personas.push(persona),
            }
        }
        Ok(self)
    }

    /// Persona identities in definition order
    pub fn list_personas(&self) -> impl Iterator<Item = &PersonaId> + '_ {
        self.personas.iter().map(Persona::id)
    }

    /// All personas in definition order
    pub fn personas(&self) -> &[Persona] {
        &self.personas
    }

    pub fn get(&self, id: &str) -> Result<&Persona, DomainError> {
        self.personas
            .iter()
            .find(|p| p.id() == id)
            .ok_or_else(|| DomainError::UnknownPersona(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.personas.iter().any(|p| p.id() == id)
    }

    /// The first persona; a registry is never empty.
    pub fn default_persona(&self) -> &Persona {
        &self.personas[0]
    }
}

impl Default for PersonaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
