//! Identity gate: who is chatting, and in which room.

use serde::{Deserialize, Serialize};

use crate::ui::{LineEvent, LineSource};

/// Cache key the current identity is stored under.
pub const IDENTITY_CACHE_KEY: &str = "user-info";

/// The (name, room) pair identifying a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Display name, kept as typed
    pub name: String,
    pub room: i64,
}

impl Identity {
    /// Build an identity from raw form values.
    ///
    /// Returns `None` when the room is not a number or the name is blank.
    /// No reason is reported; the form is simply not submitted.
    pub fn from_form(username: &str, room: &str) -> Option<Self> {
        let room = room.trim().parse::<i64>().ok()?;

        if username.trim().is_empty() {
            return None;
        }

        Some(Self {
            name: username.to_string(),
            room,
        })
    }
}

/// Two-field form asking for a name and a room number.
pub struct IdentityGate;

impl IdentityGate {
    pub const USERNAME_PROMPT: &'static str = "Username: ";
    pub const ROOM_PROMPT: &'static str = "Room number: ";

    /// Ask for an identity until a valid one is entered.
    ///
    /// Returns `None` if the user interrupts or closes the input.
    pub async fn prompt<L: LineSource>(lines: &mut L) -> Option<Identity> {
        loop {
            let username = match lines.read_line(Self::USERNAME_PROMPT).await {
                LineEvent::Line(line) => line,
                LineEvent::Interrupted | LineEvent::Eof => return None,
            };
            let room = match lines.read_line(Self::ROOM_PROMPT).await {
                LineEvent::Line(line) => line,
                LineEvent::Interrupted | LineEvent::Eof => return None,
            };

            if let Some(identity) = Identity::from_form(&username, &room) {
                tracing::debug!("Identity submitted: {:?}", identity);
                return Some(identity);
            }
        }
    }
}
