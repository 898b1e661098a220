pub mod gemini;
pub mod openai;

use std::time::Duration;

/// Build a reqwest client with the collaborator-boundary timeout applied.
pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_default()
}
