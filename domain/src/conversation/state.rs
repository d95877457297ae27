//! Conversation state

use super::entities::{Role, Segment, Turn};
use crate::core::error::DomainError;
use crate::persona::entities::{Persona, PersonaId};
use serde::Serialize;

/// A flattened `(role, text)` context entry handed to a completion provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextEntry {
    pub role: Role,
    pub text: String,
}

/// The single active conversation (Entity)
///
/// Turn 0 is always the hidden instruction seed of the active persona and
/// turn 1 its opening reply. Switching to a different persona discards every
/// turn and rebuilds the seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    persona: PersonaId,
    turns: Vec<Turn>,
}

impl ConversationState {
    /// Create a state already initialized for `persona`
    pub fn new(persona: &Persona) -> Self {
        let mut state = Self {
            persona: persona.id().clone(),
            turns: Vec::with_capacity(2),
        };
        state.initialize(persona);
        state
    }

    /// Rebuild a state from previously captured parts.
    ///
    /// The caller is responsible for the seed invariant; the session codec
    /// validates it before calling this.
    pub(crate) fn from_parts(persona: PersonaId, turns: Vec<Turn>) -> Self {
        Self { persona, turns }
    }

    /// Discard all turns and seed the conversation for `persona`.
    pub fn initialize(&mut self, persona: &Persona) {
        self.persona = persona.id().clone();
        self.turns.clear();
        self.turns
            .push(Turn::text(Role::Instruction, persona.instruction()));
        self.turns
            .push(Turn::text(Role::Assistant, persona.opening_reply()));
    }

    /// Re-initialize for `persona` when it differs from the active one.
    ///
    /// Returns `true` when the history was reset.
    pub fn switch_persona(&mut self, persona: &Persona) -> bool {
        if persona.id() == &self.persona {
            return false;
        }
        self.initialize(persona);
        true
    }

    pub fn append_user_turn(&mut self, text: &str) -> Result<(), DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::EmptyInput);
        }
        self.turns.push(Turn::text(Role::User, text));
        Ok(())
    }

    pub fn append_assistant_turn(&mut self, segments: Vec<Segment>) -> Result<(), DomainError> {
        let turn = Turn::new(Role::Assistant, segments).ok_or(DomainError::EmptyTurn)?;
        self.turns.push(turn);
        Ok(())
    }

    /// Every turn except the hidden seed, oldest first.
    ///
    /// Pure projection: call it again to restart.
    pub fn rendered_history(&self) -> impl Iterator<Item = &Turn> + '_ {
        self.turns.iter().filter(|t| t.role().is_rendered())
    }

    /// All turns, seed included, flattened to `(role, text)`.
    pub fn export_context(&self) -> Vec<ContextEntry> {
        self.turns
            .iter()
            .map(|t| ContextEntry {
                role: t.role(),
                text: t.text_content(),
            })
            .collect()
    }

    pub fn active_persona(&self) -> &PersonaId {
        &self.persona
    }

    /// Text of the hidden seed turn
    pub fn instruction(&self) -> Option<String> {
        self.turns
            .first()
            .filter(|t| t.role() == Role::Instruction)
            .map(Turn::text_content)
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The most recent turn
    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Number of user turns appended since initialization
    pub fn exchange_count(&self) -> usize {
        self.turns.iter().filter(|t| t.role() == Role::User).count()
    }
}
