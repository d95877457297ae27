//! Console output formatter for conversations

use colored::Colorize;
use persona_chat_domain::{
    Attachment, AttachmentData, Persona, PersonaId, PersonaRegistry, Role, SavedSession, Segment,
    Turn,
};

/// Formats turns, persona listings and session tokens for the terminal
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format one turn with a speaker label.
    ///
    /// `speaker` names the assistant; user turns are labelled "You".
    pub fn format_turn(turn: &Turn, speaker: &str) -> String {
        let label = match turn.role() {
            Role::Assistant => format!("{}:", speaker).magenta().bold(),
            Role::User => "You:".cyan().bold(),
            Role::Instruction => "Instruction:".dimmed(),
        };

        let body = turn
            .segments()
            .iter()
            .map(Self::format_segment)
            .collect::<Vec<_>>()
            .join("\n");

        format!("{} {}", label, body)
    }

    fn format_segment(segment: &Segment) -> String {
        match segment {
            Segment::Text(text) => text.clone(),
            Segment::Attachment(attachment) => Self::attachment_placeholder(attachment)
                .yellow()
                .to_string(),
        }
    }

    fn attachment_placeholder(attachment: &Attachment) -> String {
        match &attachment.data {
            AttachmentData::Inline { bytes } => {
                format!("[attachment: {}, {} bytes]", attachment.media_type, bytes.len())
            }
            AttachmentData::Omitted { byte_len } => format!(
                "[attachment not restored: {}, {} bytes]",
                attachment.media_type, byte_len
            ),
        }
    }

    /// Format the displayed history, oldest first
    pub fn format_history(turns: &[Turn], speaker: &str) -> String {
        turns
            .iter()
            .map(|turn| Self::format_turn(turn, speaker))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// List personas, marking the active one
    pub fn format_personas(registry: &PersonaRegistry, active: Option<&PersonaId>) -> String {
        let mut output = format!("{}\n", "Personas:".cyan().bold());
        for persona in registry.personas() {
            let marker = if Some(persona.id()) == active { "*" } else { " " };
            output.push_str(&format!(
                " {} {:<10} {}\n",
                marker.green().bold(),
                persona.id().as_str(),
                Self::display_name(persona).dimmed()
            ));
        }
        output
    }

    fn display_name(persona: &Persona) -> String {
        if persona.display_name() == persona.id().as_str() {
            String::new()
        } else {
            persona.display_name().to_string()
        }
    }

    /// Format a freshly saved session
    pub fn format_saved(saved: &SavedSession) -> String {
        let mut output = format!(
            "{}\n{}\n",
            "Session token (resume with /load <token> or --resume <token>):"
                .cyan()
                .bold(),
            saved.token
        );
        if !saved.is_lossless() {
            output.push_str(
                &format!(
                    "Note: {} attachment(s) will be restored as placeholders only.\n",
                    saved.omitted_attachments
                )
                .yellow()
                .to_string(),
            );
        }
        output
    }

    /// Header shown when a conversation starts or is replaced
    pub fn header(title: &str) -> String {
        let line = "═".repeat(50);
        format!("{}\n  {}\n{}", line.dimmed(), title.bold(), line.dimmed())
    }
}
