use std::env;
use std::time::Duration;

use log::debug;

use crate::error::ChatError;
use crate::voice::RetryPolicy;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Process-wide configuration, read from the environment exactly once at
/// startup. Components receive it by reference; nothing else in the crate
/// touches `env::var`.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub openai: OpenAiConfig,
    pub voice: VoiceConfig,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
}

/// Credentials for the conversational-voice provider. The agent id and key
/// are handed to the browser SDK; the retry policy governs session start
/// failures (absent delay means no retry).
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    pub agent_id: Option<String>,
    pub api_key: Option<String>,
    pub retry: RetryPolicy,
}

impl Config {
    pub fn from_env() -> Result<Config, ChatError> {
        let api_key =
            env::var("OPENAI_API_KEY").map_err(|_| ChatError::MissingEnv("OPENAI_API_KEY"))?;
        let api_url = env::var("OPENAI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let model = env::var("CHAT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let retry_after = env::var("VOICE_RETRY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis);

        let voice = VoiceConfig {
            agent_id: env::var("ELEVENLABS_AGENT_ID").ok(),
            api_key: env::var("ELEVENLABS_API_KEY").ok(),
            retry: RetryPolicy { retry_after },
        };

        debug!(
            "Config loaded: api_url={}, model={}, bind_addr={}, voice_agent={}",
            api_url,
            model,
            bind_addr,
            voice.agent_id.is_some()
        );

        Ok(Config {
            bind_addr,
            openai: OpenAiConfig {
                api_key,
                api_url,
                model,
            },
            voice,
        })
    }
}
