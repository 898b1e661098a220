pub mod providers;
pub mod retry;

use graphmind_core::config::ModelConfig;
use graphmind_core::traits::CompletionClient;

pub use providers::gemini::GeminiClient;
pub use providers::openai::OpenAiClient;
pub use retry::RetryingClient;

/// Create a completion client based on the provider name.
pub fn create_client(config: &ModelConfig) -> Box<dyn CompletionClient> {
    match config.provider.as_str() {
        "gemini" | "google" => Box::new(GeminiClient::new(config.timeout_secs)),
        // Everything else uses the OpenAI-compatible client
        _ => Box::new(OpenAiClient::new(config.timeout_secs)),
    }
}
