// src/llm/client/mod.rs

use reqwest::{Client as ReqwestClient, header};
use tracing::{debug, error, info};

use crate::config::BalanceConfig;
use crate::llm::analysis::AnalysisType;
use crate::llm::error::{LlmError, Result};

pub mod config;
pub mod request;
pub mod responses;
pub mod status;

pub use config::ClientConfig;
pub use request::{Endpoint, OutboundRequest, RequestBody, build_request, is_flagship_model};
pub use responses::{ContentFormat, NormalizedText, decode_body, normalize, parse_response};
pub use status::classify_status;

/// One generation call as the journaling UI or analyzer scheduler asks for it
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    pub analysis: AnalysisType,
}

impl GenerationRequest {
    /// Flagship model, weekly analysis
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: request::FLAGSHIP_MODEL.to_string(),
            analysis: AnalysisType::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_analysis(mut self, analysis: AnalysisType) -> Self {
        self.analysis = analysis;
        self
    }

    pub fn build(&self) -> OutboundRequest {
        build_request(&self.prompt, &self.model, self.analysis)
    }
}

fn preview(text: &str) -> String {
    text.chars().take(100).collect()
}

/// Client for the chat-completions and responses endpoints.
///
/// Holds no per-call state; clones share the connection pool.
#[derive(Clone)]
pub struct OpenAIClient {
    client: ReqwestClient,
    config: ClientConfig,
}

impl OpenAIClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = ReqwestClient::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LlmError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        info!(
            "Initializing OpenAI client: base_url={}, timeout={:?}",
            config.base_url(),
            config.timeout()
        );

        Ok(Self { client, config })
    }

    pub fn from_config(config: &BalanceConfig) -> Result<Self> {
        Self::new(ClientConfig::from_config(config))
    }

    /// Build from the process-wide configuration, initializing it if needed
    pub fn from_global() -> Result<Self> {
        Self::from_config(crate::config::init()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send `prompt` and return the normalized reply text
    pub async fn generate_response(
        &self,
        prompt: &str,
        model: &str,
        analysis: AnalysisType,
    ) -> Result<String> {
        info!(
            "OpenAI call started: model={}, analysis={}, prompt_len={}",
            model,
            analysis,
            prompt.chars().count()
        );
        debug!("Prompt preview: {}...", preview(prompt));

        let outbound = build_request(prompt, model, analysis);
        let found = self.send(&outbound).await.inspect_err(|e| {
            error!("OpenAI call failed: {}", e);
        })?;

        info!(
            "OpenAI response received ({} format): {}...",
            found.format,
            preview(&found.text)
        );
        Ok(found.text)
    }

    /// Same as `generate_response` with the analysis type as a raw tag
    pub async fn generate_response_str(
        &self,
        prompt: &str,
        model: &str,
        analysis: &str,
    ) -> Result<String> {
        let analysis: AnalysisType = analysis.parse()?;
        self.generate_response(prompt, model, analysis).await
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.generate_response(&request.prompt, &request.model, request.analysis)
            .await
    }

    /// One round trip: serialize, POST, classify status, normalize body
    pub async fn send(&self, outbound: &OutboundRequest) -> Result<NormalizedText> {
        let payload = outbound.to_json()?;
        let url = outbound.endpoint.url(self.config.base_url());

        debug!(
            "Request to {} (model={}): {}",
            url,
            outbound.body.model(),
            String::from_utf8_lossy(&payload)
        );

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.config.api_key()))
            .header(header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| LlmError::network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| LlmError::network(e.to_string()))?;

        debug!(
            "Response HTTP {}: {}",
            status,
            String::from_utf8_lossy(&body)
        );

        if let Some(err) = classify_status(status, &body) {
            return Err(err);
        }

        let raw = decode_body(&body)?;
        normalize(&raw, outbound.uses_responses_endpoint())
    }
}
