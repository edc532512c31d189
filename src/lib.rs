// src/lib.rs

pub mod config;
pub mod llm;

pub use config::BalanceConfig;
pub use llm::{AnalysisType, GenerationRequest, LlmError, OpenAIClient, TextGenerator};
