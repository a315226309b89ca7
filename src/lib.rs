pub mod config;
pub mod controller;
pub mod error;
pub mod message;
pub mod relay;
pub mod sse;
pub mod voice;

use crate::config::Config;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> AppState {
        AppState {
            config,
            http: reqwest::Client::new(),
        }
    }
}
