// src/llm/client/request.rs
// Endpoint selection and request body construction

use serde::Serialize;
use serde_json::Value;

use crate::llm::analysis::AnalysisType;
use crate::llm::error::{LlmError, Result};

/// Model family that gets special-cased request handling
pub const FLAGSHIP_MODEL: &str = "gpt-5";

pub const CHAT_MAX_COMPLETION_TOKENS: u32 = 2000;

/// Analyzer replies are longer structured summaries
pub const RESPONSES_MAX_OUTPUT_TOKENS: u32 = 4000;

/// Replaces the analysis instruction for flagship journal prompts; the
/// flagship otherwise burns the visible-output budget on deliberation.
pub const MINIMAL_REASONING_DIRECTIVE: &str = "Keep internal reasoning minimal. Do not plan extensively. Do not justify your output. Respond directly and concisely.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ChatCompletions,
    Responses,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Self::ChatCompletions => "/v1/chat/completions",
            Self::Responses => "/v1/responses",
        }
    }

    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Flagship journal prompt on the chat endpoint, fixed sampling
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalChatRequest {
    pub model: String,
    pub max_completion_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub messages: Vec<Message>,
}

/// Flagship analyzer prompt on the responses endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: Vec<Message>,
    pub max_output_tokens: u32,
}

/// Any other model on the chat endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_completion_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestBody {
    JournalChat(JournalChatRequest),
    Responses(ResponsesRequest),
    Chat(ChatRequest),
}

impl RequestBody {
    pub fn model(&self) -> &str {
        match self {
            Self::JournalChat(r) => &r.model,
            Self::Responses(r) => &r.model,
            Self::Chat(r) => &r.model,
        }
    }

    /// Conversation turns in the order they are sent
    pub fn messages(&self) -> &[Message] {
        match self {
            Self::JournalChat(r) => &r.messages,
            Self::Responses(r) => &r.input,
            Self::Chat(r) => &r.messages,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub endpoint: Endpoint,
    pub body: RequestBody,
}

impl OutboundRequest {
    pub fn uses_responses_endpoint(&self) -> bool {
        self.endpoint == Endpoint::Responses
    }

    /// Wire bytes for the POST body
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.body).map_err(|e| {
            LlmError::configuration(format!("Failed to serialize request body: {}", e))
        })
    }

    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(&self.body).map_err(|e| {
            LlmError::configuration(format!("Failed to serialize request body: {}", e))
        })
    }
}

/// `gpt-5` itself or a dated variant such as `gpt-5-2025-08-07`
pub fn is_flagship_model(model: &str) -> bool {
    model == FLAGSHIP_MODEL
        || model
            .strip_prefix(FLAGSHIP_MODEL)
            .is_some_and(|rest| rest.starts_with('-'))
}

/// Pick the endpoint and body shape for one call.
///
/// Branches are checked in order: flagship journal prompts go to the chat
/// endpoint with a minimal-reasoning directive, flagship analyzer prompts go
/// to the responses endpoint, and every other model uses plain chat.
pub fn build_request(prompt: &str, model: &str, analysis: AnalysisType) -> OutboundRequest {
    let system_message = analysis.system_message();
    let flagship = is_flagship_model(model);

    if flagship && analysis.is_journal() {
        // The dated variant is collapsed onto the base flagship id here
        return OutboundRequest {
            endpoint: Endpoint::ChatCompletions,
            body: RequestBody::JournalChat(JournalChatRequest {
                model: FLAGSHIP_MODEL.to_string(),
                max_completion_tokens: CHAT_MAX_COMPLETION_TOKENS,
                temperature: 1.0,
                top_p: 1.0,
                messages: vec![
                    Message::system(MINIMAL_REASONING_DIRECTIVE),
                    Message::user(prompt),
                ],
            }),
        };
    }

    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system_message {
        messages.push(Message::system(system));
    }
    messages.push(Message::user(prompt));

    if flagship {
        OutboundRequest {
            endpoint: Endpoint::Responses,
            body: RequestBody::Responses(ResponsesRequest {
                model: model.to_string(),
                input: messages,
                max_output_tokens: RESPONSES_MAX_OUTPUT_TOKENS,
            }),
        }
    } else {
        OutboundRequest {
            endpoint: Endpoint::ChatCompletions,
            body: RequestBody::Chat(ChatRequest {
                model: model.to_string(),
                messages,
                max_completion_tokens: CHAT_MAX_COMPLETION_TOKENS,
            }),
        }
    }
}
