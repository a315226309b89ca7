use std::time::Duration;

use async_trait::async_trait;
use log::{error, info};

use crate::error::ChatError;

/// Failure policy for voice session start. `retry_after` set means one
/// retry after that delay; unset means the failure is surfaced as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryPolicy {
    pub retry_after: Option<Duration>,
}

/// Seam over the conversational-voice SDK: start a session for an agent,
/// end the current session.
#[async_trait]
pub trait VoiceTransport {
    async fn start_session(&mut self, agent_id: &str) -> Result<(), ChatError>;
    async fn end_session(&mut self);
}

/// Lifecycle wrapper around a voice session. Start failures follow the one
/// configured retry policy; stopping always tears the session down so no
/// callback can outlive it.
pub struct VoiceChannel<T> {
    transport: T,
    agent_id: String,
    policy: RetryPolicy,
    active: bool,
}

impl<T: VoiceTransport> VoiceChannel<T> {
    pub fn new(transport: T, agent_id: impl Into<String>, policy: RetryPolicy) -> VoiceChannel<T> {
        VoiceChannel {
            transport,
            agent_id: agent_id.into(),
            policy,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub async fn start(&mut self) -> Result<(), ChatError> {
        if self.active {
            return Ok(());
        }
        match self.transport.start_session(&self.agent_id).await {
            Ok(()) => {
                info!("Voice session started, agent={}", self.agent_id);
                self.active = true;
                Ok(())
            }
            Err(e) => {
                error!("Voice session start failed: {}", e);
                let Some(delay) = self.policy.retry_after else {
                    return Err(e);
                };
                tokio::time::sleep(delay).await;
                match self.transport.start_session(&self.agent_id).await {
                    Ok(()) => {
                        info!("Voice session started on retry, agent={}", self.agent_id);
                        self.active = true;
                        Ok(())
                    }
                    Err(e) => {
                        error!("Voice session retry failed: {}", e);
                        Err(e)
                    }
                }
            }
        }
    }

    /// Idempotent; safe to call from every teardown path.
    pub async fn stop(&mut self) {
        if self.active {
            self.transport.end_session().await;
            self.active = false;
            info!("Voice session ended, agent={}", self.agent_id);
        }
    }
}
