//! Conversation log rendering.

use crate::project::{ConversationItem, MessageItem};
use std::io::{self, Write};

/// `ROLE: content` for one message.
#[must_use]
pub fn format_message(message: &MessageItem) -> String {
    format!(
        "{}: {}",
        message.role.to_uppercase(),
        message.first_text().unwrap_or_default()
    )
}

/// Write every message in the order given, each followed by a blank line.
///
/// Items other than messages (tool calls, reasoning) are skipped.
pub fn write_transcript<W: Write>(items: &[ConversationItem], out: &mut W) -> io::Result<()> {
    for item in items {
        if let ConversationItem::Message(message) = item {
            writeln!(out, "{}\n", format_message(message))?;
        }
    }
    Ok(())
}
