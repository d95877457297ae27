//! Conversation entities

use serde::{Deserialize, Serialize};

/// Speaker of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The hidden persona instruction, sent to the provider as user context
    Instruction,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Instruction => "instruction",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Whether turns with this role are shown to the user
    pub fn is_rendered(&self) -> bool {
        !matches!(self, Role::Instruction)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payload of an attachment segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttachmentData {
    /// Bytes carried inline
    Inline { bytes: Vec<u8> },
    /// Bytes were not carried through a save/resume cycle
    Omitted { byte_len: usize },
}

/// A binary attachment with its media type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub media_type: String,
    pub data: AttachmentData,
}

impl Attachment {
    pub fn inline(media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data: AttachmentData::Inline { bytes },
        }
    }

    pub fn byte_len(&self) -> usize {
        match &self.data {
            AttachmentData::Inline { bytes } => bytes.len(),
            AttachmentData::Omitted { byte_len } => *byte_len,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.data, AttachmentData::Inline { .. })
    }

    /// The same attachment with its bytes dropped
    pub fn detached(&self) -> Self {
        Self {
            media_type: self.media_type.clone(),
            data: AttachmentData::Omitted {
                byte_len: self.byte_len(),
            },
        }
    }
}

/// One piece of turn content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Segment {
    Text(String),
    Attachment(Attachment),
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Segment::Text(s) => Some(s),
            Segment::Attachment(_) => None,
        }
    }

    pub fn as_attachment(&self) -> Option<&Attachment> {
        match self {
            Segment::Attachment(a) => Some(a),
            Segment::Text(_) => None,
        }
    }
}

/// One message in the conversation log (Entity)
///
/// Constructed only through [`Turn::new`], which guarantees a non-empty
/// segment list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    segments: Vec<Segment>,
}

impl Turn {
    /// Returns `None` when `segments` is empty.
    pub fn new(role: Role, segments: Vec<Segment>) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(Self { role, segments })
        }
    }

    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            segments: vec![Segment::Text(text.into())],
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Text segments joined with newlines; attachments contribute nothing.
    pub fn text_content(&self) -> String {
        self.segments
            .iter()
            .filter_map(Segment::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn attachments(&self) -> impl Iterator<Item = &Attachment> + '_ {
        self.segments.iter().filter_map(Segment::as_attachment)
    }
}
