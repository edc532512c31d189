// src/llm/client/responses.rs
// Normalizes chat-completions and responses payloads into one text result

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::llm::error::{LlmError, Result};

pub const NO_CONTENT_DETAIL: &str = "no content in any recognized format";
pub const INVALID_JSON_DETAIL: &str = "Invalid JSON response";

/// Which reply shape the text was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    /// output[type=message].content[type=output_text].text
    OutputText,
    /// output[type=message].content as a plain string
    MessageString,
    /// choices[0].message.content as a string
    ChatString,
    /// choices[0].message.content[type=text].text
    ChatBlocks,
    /// choices[0].delta.content as a string
    DeltaString,
    /// choices[0].delta.content[type=text].text
    DeltaBlocks,
    /// output[type=message].content[type=output_text|text].text, any endpoint
    FallbackOutput,
}

impl ContentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutputText => "output_text",
            Self::MessageString => "message string",
            Self::ChatString => "chat string",
            Self::ChatBlocks => "chat blocks",
            Self::DeltaString => "delta string",
            Self::DeltaBlocks => "delta blocks",
            Self::FallbackOutput => "fallback output_text",
        }
    }
}

impl fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    pub text: String,
    pub format: ContentFormat,
}

impl NormalizedText {
    fn new(text: String, format: ContentFormat) -> Self {
        Self { text, format }
    }
}

/// Decodes a field as `T`, or `None` when present but of another shape
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Derived struct decodes also accept a JSON array as a field sequence, so
/// struct-shaped values must be checked to be objects first.
fn is_object_list(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().all(Value::is_object))
}

/// Like `lenient`, but only a JSON object decodes
fn lenient_object<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

/// Like `lenient`, but only a list made entirely of objects decodes
fn lenient_object_list<'de, D, T>(
    deserializer: D,
) -> std::result::Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if !is_object_list(&value) {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
}

/// A `content` field. Absent and null are kept apart because a null chat
/// message triggers the reasoning-budget check.
#[derive(Debug, Clone, Default)]
pub enum MessageContent {
    #[default]
    Absent,
    Null,
    Text(String),
    Blocks(Vec<ContentBlock>),
    Other,
}

impl<'de> Deserialize<'de> for MessageContent {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => Self::Null,
            Value::String(text) => Self::Text(text),
            blocks @ Value::Array(_) if is_object_list(&blocks) => serde_json::from_value(blocks)
                .map(Self::Blocks)
                .unwrap_or(Self::Other),
            _ => Self::Other,
        })
    }
}

impl MessageContent {
    /// Concatenated text of blocks whose type is one of `kinds`
    fn joined(&self, kinds: &[&str]) -> String {
        match self {
            Self::Blocks(blocks) => blocks
                .iter()
                .filter(|b| b.kind.as_deref().is_some_and(|k| kinds.contains(&k)))
                .filter_map(|b| b.text.as_deref())
                .collect(),
            _ => String::new(),
        }
    }

    fn non_empty_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputItem {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default)]
    pub content: MessageContent,
}

impl OutputItem {
    fn is_message(&self) -> bool {
        self.kind.as_deref() == Some("message")
    }
}

/// `{ "output": [ {type: "reasoning"}, {type: "message", content: [...]} ] }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsesPayload {
    #[serde(default, deserialize_with = "lenient_object_list")]
    pub output: Option<Vec<OutputItem>>,
}

impl ResponsesPayload {
    fn messages(&self) -> impl Iterator<Item = &OutputItem> {
        self.output.iter().flatten().filter(|item| item.is_message())
    }

    /// Strategy for the responses endpoint: output_text blocks first, then a
    /// direct string on the same message element
    fn extract(&self) -> Option<NormalizedText> {
        for item in self.messages() {
            let assembled = item.content.joined(&["output_text"]);
            if !assembled.is_empty() {
                return Some(NormalizedText::new(assembled, ContentFormat::OutputText));
            }
            if let Some(text) = item.content.non_empty_text() {
                return Some(NormalizedText::new(text.to_string(), ContentFormat::MessageString));
            }
        }
        None
    }

    /// Tolerates a server answering with the responses shape whichever
    /// endpoint was called. This can hide a genuine schema mismatch on the
    /// chat endpoint.
    fn extract_fallback(&self) -> Option<NormalizedText> {
        self.messages()
            .map(|item| item.content.joined(&["output_text", "text"]))
            .find(|assembled| !assembled.is_empty())
            .map(|text| NormalizedText::new(text, ContentFormat::FallbackOutput))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub content: MessageContent,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Choice {
    #[serde(default, deserialize_with = "lenient_object")]
    pub message: Option<ChatMessage>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub delta: Option<ChatMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionTokensDetails {
    #[serde(default, deserialize_with = "lenient")]
    pub reasoning_tokens: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage {
    #[serde(default, deserialize_with = "lenient")]
    pub completion_tokens: Option<u64>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub completion_tokens_details: Option<CompletionTokensDetails>,
}

impl Usage {
    /// `(completion, reasoning)` when both counts are reported
    fn token_split(&self) -> Option<(u64, u64)> {
        let completion = self.completion_tokens?;
        let reasoning = self.completion_tokens_details.as_ref()?.reasoning_tokens?;
        Some((completion, reasoning))
    }
}

/// `{ "choices": [ {message|delta: {content}} ], "usage": {...} }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatPayload {
    #[serde(default, deserialize_with = "lenient_object_list")]
    pub choices: Option<Vec<Choice>>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub usage: Option<Usage>,
}

impl ChatPayload {
    /// Strategy for the chat endpoint: message first, then delta.
    /// Errors only when the reasoning budget is exhausted.
    fn extract(&self) -> Result<Option<NormalizedText>> {
        let Some(choice) = self.choices.as_ref().and_then(|c| c.first()) else {
            warn!("No choices in response, trying fallback formats");
            return Ok(None);
        };

        if let Some(message) = &choice.message {
            match &message.content {
                MessageContent::Text(text) if !text.is_empty() => {
                    return Ok(Some(NormalizedText::new(text.clone(), ContentFormat::ChatString)));
                }
                MessageContent::Text(_) | MessageContent::Null => {
                    warn!("Content is null or empty, checking usage details");
                    self.check_reasoning_budget()?;
                }
                MessageContent::Blocks(_) => {
                    let assembled = message.content.joined(&["text"]);
                    if !assembled.is_empty() {
                        return Ok(Some(NormalizedText::new(assembled, ContentFormat::ChatBlocks)));
                    }
                }
                MessageContent::Absent => warn!("No content field found in message"),
                MessageContent::Other => {}
            }
        }

        if let Some(delta) = &choice.delta {
            if let Some(text) = delta.content.non_empty_text() {
                return Ok(Some(NormalizedText::new(text.to_string(), ContentFormat::DeltaString)));
            }
            let assembled = delta.content.joined(&["text"]);
            if !assembled.is_empty() {
                return Ok(Some(NormalizedText::new(assembled, ContentFormat::DeltaBlocks)));
            }
        }

        Ok(None)
    }

    fn check_reasoning_budget(&self) -> Result<()> {
        let Some((completion_tokens, reasoning_tokens)) =
            self.usage.as_ref().and_then(Usage::token_split)
        else {
            return Ok(());
        };

        warn!(
            "Token usage: {} total, {} reasoning",
            completion_tokens, reasoning_tokens
        );
        if reasoning_tokens >= completion_tokens {
            return Err(LlmError::ReasoningBudgetExhausted {
                completion_tokens,
                reasoning_tokens,
            });
        }
        Ok(())
    }
}

/// Extract the reply text from a decoded payload.
///
/// The branch strategies for the endpoint that was called run first; the
/// responses-shape fallback runs after them regardless of branch.
pub fn normalize(raw: &Value, used_responses_endpoint: bool) -> Result<NormalizedText> {
    if !raw.is_object() {
        return Err(LlmError::InvalidResponse {
            detail: INVALID_JSON_DETAIL.to_string(),
            raw: Some(raw.clone()),
        });
    }

    let responses = ResponsesPayload::deserialize(raw).unwrap_or_default();

    let found = if used_responses_endpoint {
        responses.extract()
    } else {
        ChatPayload::deserialize(raw).unwrap_or_default().extract()?
    };

    if let Some(found) = found.or_else(|| responses.extract_fallback()) {
        debug!("Extracted text using: {}", found.format);
        return Ok(found);
    }

    error!("No content found in response. Full response: {}", raw);
    Err(LlmError::InvalidResponse {
        detail: NO_CONTENT_DETAIL.to_string(),
        raw: Some(raw.clone()),
    })
}

/// Decode a response body as JSON; the raw text rides along on failure
pub fn decode_body(body: &[u8]) -> Result<Value> {
    serde_json::from_slice(body).map_err(|e| {
        error!("Response body is not JSON: {}", e);
        LlmError::InvalidResponse {
            detail: INVALID_JSON_DETAIL.to_string(),
            raw: Some(Value::String(String::from_utf8_lossy(body).into_owned())),
        }
    })
}

/// Parse a raw response body into the canonical reply text
pub fn parse_response(body: &[u8], used_responses_endpoint: bool) -> Result<String> {
    let raw = decode_body(body)?;
    normalize(&raw, used_responses_endpoint).map(|found| found.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing::Level;
    use tracing_subscriber::fmt::MakeWriter;

    #[test]
    fn test_content_absent_vs_null() {
        let absent: ChatMessage = serde_json::from_value(json!({})).unwrap();
        let null: ChatMessage = serde_json::from_value(json!({"content": null})).unwrap();

        assert!(matches!(absent.content, MessageContent::Absent));
        assert!(matches!(null.content, MessageContent::Null));
    }

    #[test]
    fn test_mixed_array_is_not_blocks() {
        let msg: ChatMessage =
            serde_json::from_value(json!({"content": [{"type": "text", "text": "a"}, 3]})).unwrap();
        assert!(matches!(msg.content, MessageContent::Other));
    }

    #[test]
    fn test_non_string_text_block_is_skipped() {
        let content: MessageContent = serde_json::from_value(json!([
            {"type": "text", "text": 42},
            {"type": "text", "text": "kept"}
        ]))
        .unwrap();
        assert_eq!(content.joined(&["text"]), "kept");
    }

    #[test]
    fn test_output_with_non_object_element_is_ignored() {
        let payload: ResponsesPayload =
            serde_json::from_value(json!({"output": ["oops", {"type": "message"}]})).unwrap();
        assert!(payload.output.is_none());
    }

    #[test]
    fn test_array_in_place_of_struct_is_ignored() {
        let choice: Choice =
            serde_json::from_value(json!({"message": [["text", "x"]], "delta": ["y"]})).unwrap();
        assert!(choice.message.is_none());
        assert!(choice.delta.is_none());

        let content: MessageContent = serde_json::from_value(json!([["text", "x"]])).unwrap();
        assert!(matches!(content, MessageContent::Other));
    }

    #[test]
    fn test_decode_body_keeps_raw_text() {
        match decode_body(b"oops") {
            Err(LlmError::InvalidResponse { detail, raw }) => {
                assert_eq!(detail, INVALID_JSON_DETAIL);
                assert_eq!(raw, Some(json!("oops")));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(decode_body(br#"{"a":1}"#).unwrap(), json!({"a": 1}));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_missing_choices_logged_at_warn() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::WARN)
            .with_ansi(false)
            .with_writer(captured.clone())
            .finish();

        let result = tracing::subscriber::with_default(subscriber, || {
            normalize(&json!({"id": "chatcmpl-1"}), false)
        });
        assert!(result.is_err());

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("WARN"));
        assert!(logs.contains("No choices in response"));
    }

    #[test]
    fn test_budget_check_needs_both_counts() {
        let usage: Usage = serde_json::from_value(json!({"completion_tokens": 10})).unwrap();
        assert!(usage.token_split().is_none());
    }

    #[test]
    fn test_non_object_payload_is_invalid_json() {
        let err = normalize(&json!([1, 2]), false).unwrap_err();
        match err {
            LlmError::InvalidResponse { detail, .. } => assert_eq!(detail, INVALID_JSON_DETAIL),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_format_reported() {
        let found = normalize(
            &json!({"choices": [{"delta": {"content": "streamed"}}]}),
            false,
        )
        .unwrap();
        assert_eq!(found.format, ContentFormat::DeltaString);
        assert_eq!(found.text, "streamed");
    }
}
