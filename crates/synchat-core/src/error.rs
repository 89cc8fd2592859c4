//! Error taxonomy for the chat session
//!
//! Only `AuthExpired` and `Transport` ever reach the user as error text.
//! Timeout and cancellation are normal terminal states of a session, and
//! malformed frames are absorbed by the decoder.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// No stored credential, or the server rejected ours. The caller must
    /// clear credentials and re-authenticate; no retry is attempted here.
    #[error("authentication expired - please log in again")]
    AuthExpired,

    /// The streaming request or a chunk read failed.
    #[error("chat transport failed: {0}")]
    Transport(String),

    /// A send was attempted while another session is still streaming.
    #[error("a message is already streaming - cancel it or wait")]
    SessionActive,

    /// Both the message text and the attachment list were empty.
    #[error("nothing to send - message and attachments are both empty")]
    EmptyMessage,

    /// An attachment failed pre-upload validation.
    #[error("attachment rejected: {0}")]
    InvalidAttachment(String),
}
