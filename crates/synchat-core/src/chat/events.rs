//! Render events emitted by a chat session
//!
//! The renderer is an opaque sink on the far side of an unbounded channel;
//! it owns the "one growing assistant message" rule by tracking whether a
//! block is open when deltas arrive.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChatEvent {
    /// The user's outbound content, echoed before the request is issued.
    #[serde(rename = "user_message")]
    UserMessage { text: String, attachments: usize },

    /// A slice of assistant content. All deltas of one session extend the
    /// same assistant message.
    #[serde(rename = "assistant_delta")]
    AssistantDelta { delta: String },

    /// A server-reported error frame. Styled differently but does not end
    /// the session by itself.
    #[serde(rename = "assistant_error")]
    AssistantError { message: String },

    /// A session-level notice (timeout, empty response).
    #[serde(rename = "notice")]
    Notice { text: String },

    /// Terminal state reached; UI controls return to idle. Emitted exactly
    /// once per session.
    #[serde(rename = "idle")]
    Idle,
}
