use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("OpenAI API error: {0}")]
    Upstream(String),
    #[error("voice session error: {0}")]
    Voice(String),
}
