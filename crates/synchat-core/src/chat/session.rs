//! Streaming chat session state machine
//!
//! One exchange at a time: `send` opens the streaming request, runs the
//! decode-and-dispatch loop, and races it against explicit cancellation and
//! a fixed timeout. Whichever terminal trigger fires first wins; teardown
//! runs exactly once per session, so the loser's effects are suppressed.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::error::ChatError;

use super::events::ChatEvent;
use super::extract::{extract, Extracted};
use super::sentinel::TerminationSignals;
use super::sse::{Frame, SseLineDecoder};
use super::transport::ChatTransport;

const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(30);
const TIMEOUT_NOTICE: &str = "Response timed out. Please try again.";
const NO_DATA_NOTICE: &str = "No response data received.";

/// Image attachment for a multipart send. Construction validates the file
/// type against what the backend accepts.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ChatError> {
        let file_name = file_name.into();
        let extension = Path::new(&file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");
        let mime_type = mime_for_extension(extension).ok_or_else(|| {
            ChatError::InvalidAttachment(format!("unsupported image type: {}", file_name))
        })?;
        Ok(Self {
            file_name,
            mime_type,
            bytes,
        })
    }
}

/// The image types the backend accepts.
fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// One outbound exchange: message text and/or attachments.
#[derive(Debug, Clone, Default)]
pub struct OutboundMessage {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.attachments.is_empty()
    }
}

/// Per-send state. Created at send, dropped at teardown.
struct SessionState {
    completed: bool,
    received_any_data: bool,
    decoder: SseLineDecoder,
}

impl SessionState {
    fn new() -> Self {
        Self {
            completed: false,
            received_any_data: false,
            decoder: SseLineDecoder::new(),
        }
    }
}

/// Chat client: owns the transport, the sentinel set, and the at-most-one
/// active session invariant. Render events go out over an unbounded channel.
pub struct ChatClient {
    transport: Arc<dyn ChatTransport>,
    events: mpsc::UnboundedSender<ChatEvent>,
    signals: TerminationSignals,
    stream_timeout: Duration,
    /// Cancellation token of the in-flight session, if any. One token per
    /// send, replaced rather than reused.
    active: Mutex<Option<CancellationToken>>,
}

impl ChatClient {
    pub fn new(transport: Arc<dyn ChatTransport>, events: mpsc::UnboundedSender<ChatEvent>) -> Self {
        Self {
            transport,
            events,
            signals: TerminationSignals::default(),
            stream_timeout: DEFAULT_STREAM_TIMEOUT,
            active: Mutex::new(None),
        }
    }

    pub fn with_stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    pub fn with_signals(mut self, signals: TerminationSignals) -> Self {
        self.signals = signals;
        self
    }

    /// Run one exchange to its terminal state.
    ///
    /// Cancellation and timeout resolve to `Ok(())` - they are terminal
    /// states, not failures. Only `AuthExpired` and `Transport` surface as
    /// errors; both still tear the session down first.
    pub async fn send(&self, outbound: OutboundMessage) -> Result<(), ChatError> {
        if outbound.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let cancel = {
            let mut active = self.active.lock();
            if active.is_some() {
                return Err(ChatError::SessionActive);
            }
            let token = CancellationToken::new();
            *active = Some(token.clone());
            token
        };

        let result = self.run_session(&outbound, &cancel).await;

        // Teardown, exactly once per session: disarm everything, release
        // the reader (dropped with the loop), reset the UI to idle.
        cancel.cancel();
        *self.active.lock() = None;
        let _ = self.events.send(ChatEvent::Idle);
        result
    }

    /// Signal the in-flight session, if any. Idempotent; a no-op when the
    /// session is already past its terminal state or none is active. The
    /// loop observes the token before any further render.
    pub fn cancel(&self) {
        if let Some(token) = self.active.lock().as_ref() {
            info!("cancelling active chat session");
            token.cancel();
        }
    }

    async fn run_session(
        &self,
        outbound: &OutboundMessage,
        cancel: &CancellationToken,
    ) -> Result<(), ChatError> {
        // The user's outbound content renders immediately, separately from
        // the streamed response.
        let _ = self.events.send(ChatEvent::UserMessage {
            text: outbound.text.clone(),
            attachments: outbound.attachments.len(),
        });

        let deadline = Instant::now() + self.stream_timeout;

        // The timeout covers the initial response too, not just chunk reads.
        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            _ = time::sleep_until(deadline) => {
                self.notify_timeout();
                return Ok(());
            }
            opened = self.transport.open_stream(outbound) => opened?,
        };

        let mut session = SessionState::new();
        while !session.completed {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("session cancelled mid-stream");
                    return Ok(());
                }
                _ = time::sleep_until(deadline) => {
                    self.notify_timeout();
                    return Ok(());
                }
                chunk = stream.next() => chunk,
            };

            match chunk {
                Some(Ok(bytes)) => {
                    if !bytes.is_empty() {
                        session.received_any_data = true;
                    }
                    for frame in session.decoder.push_chunk(&bytes) {
                        if self.dispatch(&mut session, frame) {
                            // Terminal sentinel: remaining lines of this
                            // chunk are dropped.
                            break;
                        }
                    }
                }
                Some(Err(e)) => return Err(e),
                None => {
                    if let Some(frame) = session.decoder.finish() {
                        self.dispatch(&mut session, frame);
                    }
                    if !session.received_any_data {
                        let _ = self.events.send(ChatEvent::Notice {
                            text: NO_DATA_NOTICE.to_string(),
                        });
                    }
                    break;
                }
            }
        }

        debug!("session reached terminal state");
        Ok(())
    }

    /// Classify and act on one frame. Returns true once the session is
    /// complete.
    fn dispatch(&self, session: &mut SessionState, frame: Frame) -> bool {
        match frame {
            Frame::Blank => {}
            Frame::Other(line) => trace!("ignoring non-event line: {}", line),
            Frame::Data(payload) => {
                if self.signals.is_terminal(&payload) {
                    debug!("termination sentinel observed");
                    session.completed = true;
                    return true;
                }
                match serde_json::from_str::<Value>(&payload) {
                    Ok(value) => match extract(&value) {
                        Some(Extracted::Text(text)) => {
                            let _ = self.events.send(ChatEvent::AssistantDelta { delta: text });
                        }
                        Some(Extracted::Error(message)) => {
                            let _ = self.events.send(ChatEvent::AssistantError { message });
                        }
                        None => trace!("frame carried no displayable content"),
                    },
                    // Non-JSON payloads that do not look like a broken
                    // object render literally; broken objects are dropped.
                    Err(_) => {
                        if !payload.is_empty() && !payload.starts_with('{') {
                            let _ = self
                                .events
                                .send(ChatEvent::AssistantDelta { delta: payload });
                        } else {
                            trace!("dropping malformed frame");
                        }
                    }
                }
            }
        }
        session.completed
    }

    fn notify_timeout(&self) {
        info!("chat stream timed out");
        let _ = self.events.send(ChatEvent::Notice {
            text: TIMEOUT_NOTICE.to_string(),
        });
    }
}
