// src/llm/client/status.rs
// HTTP status classification, checked before any body parsing

use serde::Deserialize;

use crate::llm::error::LlmError;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    kind: Option<String>,
}

fn is_insufficient_quota(body: &[u8]) -> bool {
    serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.kind)
        .is_some_and(|kind| kind == "insufficient_quota")
}

/// `None` on 200, otherwise the classified failure for `status`
pub fn classify_status(status: u16, body: &[u8]) -> Option<LlmError> {
    match status {
        200 => None,
        429 if is_insufficient_quota(body) => Some(LlmError::QuotaExceeded),
        429 => Some(LlmError::RateLimited),
        401 => Some(LlmError::InvalidApiKey),
        _ => {
            let text = std::str::from_utf8(body).unwrap_or("Unknown error");
            Some(LlmError::api(format!("HTTP {}: {}", status, text)))
        }
    }
}
