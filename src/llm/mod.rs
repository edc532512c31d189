// src/llm/mod.rs
// LLM module exports and submodule declarations

pub mod analysis;
pub mod client;
pub mod error;
pub mod provider;

// Export the main client
pub use client::{GenerationRequest, OpenAIClient};

pub use analysis::AnalysisType;
pub use error::LlmError;
pub use provider::TextGenerator;
