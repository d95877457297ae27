//! Save/resume codec for [`ConversationState`].
//!
//! A token is the lowercase hex of `payload || checksum`, where `payload` is a
//! JSON document and `checksum` the first [`CHECKSUM_LEN`] bytes of the
//! payload's SHA-256. Inline attachment bytes are never written; they come
//! back as [`AttachmentData::Omitted`] and the number dropped is reported on
//! [`SavedSession`].

use crate::conversation::entities::{AttachmentData, Role, Segment, Turn};
use crate::conversation::state::ConversationState;
use crate::persona::entities::PersonaId;
use crate::persona::registry::PersonaRegistry;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Current payload format version
pub const FORMAT_VERSION: u32 = 1;

/// Number of checksum bytes appended to the payload
pub const CHECKSUM_LEN: usize = 4;

/// Errors produced while encoding or decoding a session token
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Cannot encode session: {0}")]
    Encode(String),

    #[error("Malformed session token: {0}")]
    Malformed(String),

    #[error("Session token refers to unknown persona: {0}")]
    UnknownPersona(String),
}

/// Result of encoding a conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSession {
    /// The opaque token to hand to the user
    pub token: String,
    /// Inline attachments whose bytes are not carried by the token
    pub omitted_attachments: usize,
}

impl SavedSession {
    /// Whether decoding the token restores every segment byte for byte
    pub fn is_lossless(&self) -> bool {
        self.omitted_attachments == 0
    }
}

impl std::fmt::Display for SavedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token)
    }
}

#[derive(Serialize, Deserialize)]
struct Payload {
    version: u32,
    persona: PersonaId,
    turns: Vec<Turn>,
}

/// Encodes and decodes conversation tokens
pub struct SessionCodec;

impl SessionCodec {
    /// Serialize `state` into a token.
    ///
    /// Deterministic: the same state always yields the same token.
    pub fn encode(state: &ConversationState) -> Result<SavedSession, CodecError> {
        let mut omitted_attachments = 0;
        let turns = state
            .turns()
            .iter()
            .map(|turn| {
                let segments = turn
                    .segments()
                    .iter()
                    .map(|segment| match segment {
                        Segment::Text(text) => Segment::Text(text.clone()),
                        Segment::Attachment(attachment) => {
                            if attachment.is_inline() {
                                omitted_attachments += 1;
                            }
                            Segment::Attachment(attachment.detached())
                        }
                    })
                    .collect();
                // segments mirror a non-empty turn, so this never falls back
                Turn::new(turn.role(), segments).unwrap_or_else(|| turn.clone())
            })
            .collect();

        let payload = Payload {
            version: FORMAT_VERSION,
            persona: state.active_persona().clone(),
            turns,
        };

        let mut bytes =
            serde_json::to_vec(&payload).map_err(|e| CodecError::Encode(e.to_string()))?;
        let checksum = Self::checksum(&bytes);
        bytes.extend_from_slice(&checksum);

        Ok(SavedSession {
            token: hex::encode(bytes),
            omitted_attachments,
        })
    }

    /// Rebuild a conversation from `token`, resolving its persona in `registry`.
    pub fn decode(
        token: &str,
        registry: &PersonaRegistry,
    ) -> Result<ConversationState, CodecError> {
        let bytes = hex::decode(token.trim())
            .map_err(|e| CodecError::Malformed(format!("not a hex string: {}", e)))?;

        if bytes.len() <= CHECKSUM_LEN {
            return Err(CodecError::Malformed("token too short".to_string()));
        }

        let (body, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
        if Self::checksum(body) != checksum {
            return Err(CodecError::Malformed("checksum mismatch".to_string()));
        }

        let payload: Payload = serde_json::from_slice(body)
            .map_err(|e| CodecError::Malformed(format!("invalid payload: {}", e)))?;

        if payload.version != FORMAT_VERSION {
            return Err(CodecError::Malformed(format!(
                "unsupported format version {}",
                payload.version
            )));
        }

        Self::validate_structure(&payload.turns)?;

        if !registry.contains(payload.persona.as_str()) {
            return Err(CodecError::UnknownPersona(payload.persona.to_string()));
        }

        Ok(ConversationState::from_parts(payload.persona, payload.turns))
    }

    fn validate_structure(turns: &[Turn]) -> Result<(), CodecError> {
        match turns.first() {
            Some(seed) if seed.role() == Role::Instruction => {}
            Some(_) => {
                return Err(CodecError::Malformed(
                    "first turn is not the persona instruction".to_string(),
                ));
            }
            None => return Err(CodecError::Malformed("no turns".to_string())),
        }

        if turns[1..].iter().any(|t| t.role() == Role::Instruction) {
            return Err(CodecError::Malformed(
                "instruction turn after the seed".to_string(),
            ));
        }

        // Opening reply, then strictly paired user/assistant exchanges
        if turns.len() < 2 || turns[1].role() != Role::Assistant {
            return Err(CodecError::Malformed(
                "opening reply missing after the seed".to_string(),
            ));
        }
        if turns.len() % 2 != 0 {
            return Err(CodecError::Malformed(
                "last exchange has no reply".to_string(),
            ));
        }
        for (offset, turn) in turns[2..].iter().enumerate() {
            let expected = if offset % 2 == 0 {
                Role::User
            } else {
                Role::Assistant
            };
            if turn.role() != expected {
                return Err(CodecError::Malformed(format!(
                    "turn {} should be {}, found {}",
                    offset + 2,
                    expected,
                    turn.role()
                )));
            }
        }

        // Deserialization bypasses Turn::new, so re-check the segment invariant
        if turns.iter().any(|t| t.segments().is_empty()) {
            return Err(CodecError::Malformed("turn without segments".to_string()));
        }

        let has_inline = turns
            .iter()
            .flat_map(Turn::attachments)
            .any(|a| matches!(a.data, AttachmentData::Inline { .. }));
        if has_inline {
            return Err(CodecError::Malformed(
                "inline attachment data in token".to_string(),
            ));
        }

        Ok(())
    }

    fn checksum(bytes: &[u8]) -> [u8; CHECKSUM_LEN] {
        let digest = Sha256::digest(bytes);
        let mut out = [0u8; CHECKSUM_LEN];
        out.copy_from_slice(&digest[..CHECKSUM_LEN]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::entities::Attachment;
    use crate::persona::entities::Persona;

    fn registry() -> PersonaRegistry {
        PersonaRegistry::new(vec![
            Persona::new("A", "X", "Hello"),
            Persona::new("B", "Y", "Yo"),
        ])
        .unwrap()
    }

    fn conversation() -> ConversationState {
        let registry = registry();
        let mut state = ConversationState::new(registry.get("A").unwrap());
        state.append_user_turn("hi").unwrap();
        state
            .append_assistant_turn(vec![Segment::text("there")])
            .unwrap();
        state.append_user_turn("こんにちは、元気？").unwrap();
        state
            .append_assistant_turn(vec![Segment::text("元気だワン！"), Segment::text("🐶")])
            .unwrap();
        state
    }

    #[test]
    fn test_round_trip_preserves_state() {
        let state = conversation();
        let saved = SessionCodec::encode(&state).unwrap();
        assert!(saved.is_lossless());

        let restored = SessionCodec::decode(&saved.token, &registry()).unwrap();
        assert_eq!(restored, state);
        assert_eq!(restored.active_persona(), "A");
    }

    #[test]
    fn test_round_trip_fresh_state() {
        let state = ConversationState::new(registry().get("B").unwrap());
        let saved = SessionCodec::encode(&state).unwrap();
        let restored = SessionCodec::decode(&saved.token, &registry()).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_encode_is_deterministic_lowercase_hex() {
        let state = conversation();
        let a = SessionCodec::encode(&state).unwrap();
        let b = SessionCodec::encode(&state).unwrap();
        assert_eq!(a, b);
        assert!(
            a.token
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn test_decode_tolerates_surrounding_whitespace() {
        let state = conversation();
        let token = format!("  {}\n", SessionCodec::encode(&state).unwrap().token);
        assert_eq!(SessionCodec::decode(&token, &registry()).unwrap(), state);
    }

    #[test]
    fn test_attachments_reported_and_detached() {
        let mut state = conversation();
        state.append_user_turn("show me").unwrap();
        state
            .append_assistant_turn(vec![
                Segment::text("look"),
                Segment::Attachment(Attachment::inline("image/png", vec![7; 16])),
            ])
            .unwrap();

        let saved = SessionCodec::encode(&state).unwrap();
        assert_eq!(saved.omitted_attachments, 1);
        assert!(!saved.is_lossless());

        let restored = SessionCodec::decode(&saved.token, &registry()).unwrap();
        let last = restored.last_turn().unwrap();
        assert_eq!(last.text_content(), "look");
        let attachment = last.attachments().next().unwrap();
        assert_eq!(attachment.media_type, "image/png");
        assert_eq!(attachment.data, AttachmentData::Omitted { byte_len: 16 });

        let text: Vec<String> = state.rendered_history().map(Turn::text_content).collect();
        let restored_text: Vec<String> =
            restored.rendered_history().map(Turn::text_content).collect();
        assert_eq!(text, restored_text);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let registry = registry();
        for token in ["", "zz", "not hex at all", "abcd", "00"] {
            assert!(matches!(
                SessionCodec::decode(token, &registry),
                Err(CodecError::Malformed(_))
            ));
        }
    }

    #[test]
    fn test_decode_rejects_tampered_token() {
        let mut token = SessionCodec::encode(&conversation()).unwrap().token;
        // Flip one hex digit inside the payload
        let flipped = if token.starts_with('7') { "8" } else { "7" };
        token.replace_range(0..1, flipped);
        assert_eq!(
            SessionCodec::decode(&token, &registry()),
            Err(CodecError::Malformed("checksum mismatch".to_string()))
        );
    }

    #[test]
    fn test_decode_rejects_unknown_persona() {
        let other = PersonaRegistry::new(vec![Persona::new("Z", "?", "!")]).unwrap();
        let token = SessionCodec::encode(&conversation()).unwrap().token;
        assert_eq!(
            SessionCodec::decode(&token, &other),
            Err(CodecError::UnknownPersona("A".to_string()))
        );
    }

    fn token_for(json: &str) -> String {
        let mut bytes = json.as_bytes().to_vec();
        bytes.extend_from_slice(&SessionCodec::checksum(json.as_bytes()));
        hex::encode(bytes)
    }

    #[test]
    fn test_decode_rejects_missing_seed() {
        let json = r#"{"version":1,"persona":"A","turns":[{"role":"assistant","segments":[{"type":"text","value":"Hello"}]}]}"#;
        assert!(matches!(
            SessionCodec::decode(&token_for(json), &registry()),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_seed_without_opening() {
        let json = r#"{"version":1,"persona":"A","turns":[{"role":"instruction","segments":[{"type":"text","value":"X"}]}]}"#;
        assert_eq!(
            SessionCodec::decode(&token_for(json), &registry()),
            Err(CodecError::Malformed(
                "opening reply missing after the seed".to_string()
            ))
        );
    }

    #[test]
    fn test_decode_rejects_user_turn_in_opening_slot() {
        let json = r#"{"version":1,"persona":"A","turns":[{"role":"instruction","segments":[{"type":"text","value":"X"}]},{"role":"user","segments":[{"type":"text","value":"hi"}]},{"role":"user","segments":[{"type":"text","value":"again"}]},{"role":"assistant","segments":[{"type":"text","value":"there"}]}]}"#;
        assert_eq!(
            SessionCodec::decode(&token_for(json), &registry()),
            Err(CodecError::Malformed(
                "opening reply missing after the seed".to_string()
            ))
        );
    }

    #[test]
    fn test_decode_rejects_consecutive_user_turns() {
        let json = r#"{"version":1,"persona":"A","turns":[{"role":"instruction","segments":[{"type":"text","value":"X"}]},{"role":"assistant","segments":[{"type":"text","value":"Hello"}]},{"role":"user","segments":[{"type":"text","value":"hi"}]},{"role":"user","segments":[{"type":"text","value":"again"}]}]}"#;
        assert_eq!(
            SessionCodec::decode(&token_for(json), &registry()),
            Err(CodecError::Malformed(
                "turn 3 should be assistant, found user".to_string()
            ))
        );
    }

    #[test]
    fn test_decode_rejects_unanswered_user_turn() {
        let json = r#"{"version":1,"persona":"A","turns":[{"role":"instruction","segments":[{"type":"text","value":"X"}]},{"role":"assistant","segments":[{"type":"text","value":"Hello"}]},{"role":"user","segments":[{"type":"text","value":"hi"}]}]}"#;
        assert_eq!(
            SessionCodec::decode(&token_for(json), &registry()),
            Err(CodecError::Malformed("last exchange has no reply".to_string()))
        );
    }

    #[test]
    fn test_decode_rejects_empty_turn() {
        let json = r#"{"version":1,"persona":"A","turns":[{"role":"instruction","segments":[{"type":"text","value":"X"}]},{"role":"assistant","segments":[]}]}"#;
        assert_eq!(
            SessionCodec::decode(&token_for(json), &registry()),
            Err(CodecError::Malformed("turn without segments".to_string()))
        );
    }

    #[test]
    fn test_decode_rejects_future_version() {
        let json = r#"{"version":2,"persona":"A","turns":[{"role":"instruction","segments":[{"type":"text","value":"X"}]}]}"#;
        assert_eq!(
            SessionCodec::decode(&token_for(json), &registry()),
            Err(CodecError::Malformed("unsupported format version 2".to_string()))
        );
    }
}
