//! Message formatting utilities for client display.

use hiroba_shared::time::format_local_timestamp;

use crate::{dto::ChatMessage, identity::Identity};

const RULE: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Lines of one chat message, local time zone.
    ///
    /// ```text
    /// Name: alice
    /// January 1, 2023 at 12:00:00 AM +09:00
    /// Hello, world!
    ///
    /// ```
    ///
    /// Line breaks inside the message are kept; the trailing empty line
    /// separates messages.
    pub fn chat_message_lines(message: &ChatMessage) -> Vec<String> {
        Self::lines_with_time(message, format_local_timestamp(message.timestamp))
    }

    fn lines_with_time(message: &ChatMessage, sent_at: String) -> Vec<String> {
        // A line break in the name must count as a transcript line too
        let mut name = message.name.lines();
        let mut lines = vec![format!("Name: {}", name.next().unwrap_or_default())];
        lines.extend(name.map(str::to_string));
        lines.push(sent_at);
        lines.extend(message.message.lines().map(str::to_string));
        if message.message.is_empty() {
            lines.push(String::new());
        }
        lines.push(String::new());
        lines
    }

    /// Lines of a whole transcript.
    pub fn transcript_lines(messages: &[ChatMessage]) -> Vec<String> {
        messages.iter().flat_map(Self::chat_message_lines).collect()
    }

    /// Banner shown when entering a room
    pub fn format_room_entered(identity: &Identity) -> String {
        format!(
            "\n{RULE}\n\
             Room {} as '{}'\n\
             Type messages and press Enter to send.\n\
             /up [n], /down [n], /bottom to scroll; /leave to change room; /quit to exit\n\
             {RULE}\n",
            identity.room, identity.name
        )
    }

    /// Prompt shown while in a room
    pub fn room_prompt(identity: &Identity) -> String {
        format!("{}@{}> ", identity.name, identity.room)
    }

    /// A window of the transcript, with its position
    ///
    /// # Arguments
    ///
    /// * `lines` - The visible lines
    /// * `first` - Index of the first visible line (0-based)
    /// * `total` - Total number of transcript lines
    pub fn format_window(lines: &[String], first: usize, total: usize) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{RULE}\n"));

        if lines.is_empty() {
            output.push_str("(No messages)\n");
        } else {
            for line in lines {
                output.push_str(line);
                output.push('\n');
            }
        }

        output.push_str(&format!(
            "---- lines {}-{} of {} ----\n",
            if lines.is_empty() { 0 } else { first + 1 },
            first + lines.len(),
            total
        ));
        output
    }

    /// Alert text
    pub fn format_alert(message: &str) -> String {
        format!("\n[!] {}\n", message)
    }
}
