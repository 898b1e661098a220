use serde::de::DeserializeOwned;
use tracing::warn;

/// Parse an LLM response as JSON, degrading to `T::default()` on failure.
///
/// Models frequently wrap JSON in prose or markdown fences; if the raw
/// response does not parse, the first top-level `{...}` block is recovered
/// and tried. Parse failures are never surfaced to the caller — the
/// pipeline continues with an empty result set.
pub fn parse_or_empty<T: DeserializeOwned + Default>(response: &str) -> T {
    if let Ok(value) = serde_json::from_str(response) {
        return value;
    }

    if let Some(block) = first_json_block(response) {
        match serde_json::from_str(block) {
            Ok(value) => return value,
            Err(e) => warn!(error = %e, "Failed to parse recovered JSON block"),
        }
    } else {
        warn!("No JSON object found in LLM response");
    }

    T::default()
}

/// Recover the first top-level `{...}` block from a response.
fn first_json_block(response: &str) -> Option<&str> {
    // Greedy brace-to-brace match across newlines, like re.search(r"\{.*\}", s, DOTALL)
    let re = regex::Regex::new(r"(?s)\{.*\}").ok()?;
    re.find(response).map(|m| m.as_str())
}
