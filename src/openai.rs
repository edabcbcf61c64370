//! OpenAI client construction.
//!
//! The API key is read from `OPENAI_API_KEY` by the client itself; callers
//! construct one handle up front and pass it down rather than initializing
//! module-level state.

use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create an OpenAI client with an explicit request timeout.
///
/// Long transcription and embedding calls can otherwise hang indefinitely
/// on a stalled connection.
pub fn create_client(timeout_secs: u64) -> Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .expect("Failed to create HTTP client");

    Client::with_config(OpenAIConfig::default()).with_http_client(http_client)
}
