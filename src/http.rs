//! Small helpers shared by the HTTP-backed stages.

use std::time::Duration;

/// A client with a per-request timeout.
///
/// Falls back to a default client if the builder fails.
pub fn client_with_timeout(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Best human-readable message from an error response body.
///
/// Understands `{"error": {"message": ...}}`, `{"error": "..."}` and
/// `{"errors": [{"message": ...}]}`; otherwise uses the status text.
pub fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let fallback = || {
        status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.to_string())
    };

    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return fallback();
    };

    json["error"]["message"]
        .as_str()
        .or_else(|| json["error"].as_str())
        .or_else(|| json["errors"][0]["message"].as_str())
        .map(str::to_string)
        .unwrap_or_else(fallback)
}
