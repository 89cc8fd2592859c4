//! HTTP transport for the chatbot endpoints
//!
//! Streaming exchanges go to `POST /api/my/chatbot/stream` as multipart
//! (text part `message`, file parts `images`); the one-shot generation
//! endpoint is `POST /api/my/chatbot`. Both carry the stored bearer token.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::CredentialStore;
use crate::error::ChatError;

use super::session::OutboundMessage;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ChatError>> + Send>>;

/// Issues the streaming request and hands back the raw byte stream.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn open_stream(&self, outbound: &OutboundMessage) -> Result<ByteStream, ChatError>;
}

/// JSON envelope the backend wraps non-streaming responses in.
#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    code: Option<i64>,
    data: Option<Value>,
    message: Option<String>,
}

pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<CredentialStore>,
}

impl HttpTransport {
    pub fn new(base_url: String, credentials: Arc<CredentialStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    async fn bearer_token(&self) -> Result<String, ChatError> {
        match self.credentials.load().await {
            Some(credential) => Ok(credential.access_token),
            None => Err(ChatError::AuthExpired),
        }
    }

    /// One-shot, non-streaming generation. Returns the `data.generation`
    /// string out of the response envelope.
    pub async fn generate(&self, message: &str) -> Result<String, ChatError> {
        let token = self.bearer_token().await?;
        let url = format!("{}/api/my/chatbot", self.base_url);
        debug!("generate request to {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .body(message.to_string())
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        let envelope: ResponseEnvelope = serde_json::from_str(&body)
            .map_err(|e| ChatError::Transport(format!("malformed response envelope: {}", e)))?;
        envelope
            .data
            .as_ref()
            .and_then(|data| data.get("generation"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ChatError::Transport("response carried no generation".to_string()))
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn open_stream(&self, outbound: &OutboundMessage) -> Result<ByteStream, ChatError> {
        let token = self.bearer_token().await?;
        let url = format!("{}/api/my/chatbot/stream", self.base_url);
        info!(
            "opening chat stream: {} chars, {} attachment(s)",
            outbound.text.len(),
            outbound.attachments.len()
        );

        let mut form = Form::new();
        if !outbound.text.is_empty() {
            form = form.text("message", outbound.text.clone());
        }
        for attachment in &outbound.attachments {
            let part = Part::bytes(attachment.bytes.clone())
                .file_name(attachment.file_name.clone())
                .mime_str(attachment.mime_type)
                .map_err(|e| ChatError::Transport(e.to_string()))?;
            form = form.part("images", part);
        }

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let stream = response
            .bytes_stream()
            .map_err(|e| ChatError::Transport(e.to_string()));
        Ok(Box::pin(stream))
    }
}

/// Map a non-success response to the error taxonomy. The envelope `message`
/// field is preferred over the bare status line when the body parses.
fn classify_status(status: StatusCode, body: &str) -> ChatError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return ChatError::AuthExpired;
    }
    let detail = serde_json::from_str::<ResponseEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.message)
        .unwrap_or_else(|| status.to_string());
    ChatError::Transport(detail)
}
