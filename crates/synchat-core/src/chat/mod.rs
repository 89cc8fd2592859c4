//! Streaming chat session
//!
//! One component: a session that posts a message (plus optional image
//! attachments) and consumes the line-framed streaming response, emitting
//! render events as content arrives. Cancellable, time-bounded, idempotent
//! teardown.

pub mod events;
pub mod extract;
pub mod sentinel;
pub mod session;
pub mod sse;
pub mod transport;

pub use events::ChatEvent;
pub use sentinel::TerminationSignals;
pub use session::{Attachment, ChatClient, OutboundMessage};
pub use transport::{ByteStream, ChatTransport, HttpTransport};
