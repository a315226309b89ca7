use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use log::error;
use serde_json::json;

use crate::error::ChatError;
use crate::message::{Message, Role};

/// Fixed reply shown in place of an assistant turn when the relay fails.
pub const FALLBACK_REPLY: &str = "Ocorreu um erro. Por favor, tente novamente.";

/// Transport seam between the conversation and the chat relay: hand over the
/// full transcript, receive the reply as raw byte chunks.
#[async_trait]
pub trait RelayClient {
    async fn send_transcript(
        &self,
        transcript: &[Message],
    ) -> Result<BoxStream<'static, Result<Bytes, ChatError>>, ChatError>;
}

/// `RelayClient` over HTTP, pointed at a running relay's `/api/chat`.
pub struct HttpRelayClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpRelayClient {
    pub fn new(endpoint: impl Into<String>) -> HttpRelayClient {
        HttpRelayClient {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    async fn send_transcript(
        &self,
        transcript: &[Message],
    ) -> Result<BoxStream<'static, Result<Bytes, ChatError>>, ChatError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "messages": transcript }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Upstream(format!("relay returned {}", status)));
        }
        Ok(response.bytes_stream().map_err(ChatError::from).boxed())
    }
}

/// In-memory conversation for one page session. Owns the transcript, appends
/// the user turn on submit, and grows the assistant turn in place as chunks
/// arrive, giving the caller the live "typing" view after each update.
pub struct Conversation<C> {
    relay: C,
    transcript: Vec<Message>,
}

impl<C: RelayClient> Conversation<C> {
    pub fn new(relay: C) -> Conversation<C> {
        Conversation {
            relay,
            transcript: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Submit a user message and stream the assistant's reply into the
    /// transcript. Any transport failure discards partial output from this
    /// turn and substitutes the fixed apology; errors never propagate.
    pub async fn send(&mut self, content: impl Into<String>) {
        self.transcript.push(Message::user(content));

        if let Err(e) = self.stream_reply().await {
            error!("Chat request failed: {}", e);
            if matches!(self.transcript.last(), Some(m) if m.role == Role::Assistant) {
                self.transcript.pop();
            }
            self.transcript.push(Message::assistant(FALLBACK_REPLY));
        }
    }

    async fn stream_reply(&mut self) -> Result<(), ChatError> {
        let mut stream = self.relay.send_transcript(&self.transcript).await?;
        let mut reply = String::new();
        let mut appended = false;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            reply.push_str(&String::from_utf8_lossy(&chunk));
            if appended {
                if let Some(last) = self.transcript.last_mut() {
                    last.content = reply.clone();
                }
            } else {
                self.transcript.push(Message::assistant(reply.clone()));
                appended = true;
            }
        }
        Ok(())
    }
}
