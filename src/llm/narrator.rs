use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result};
use crate::llm::client::OllamaClient;
use crate::llm::prompts::build_prompt;
use crate::pipeline::Narrator;
use crate::schema::InterestReport;
use log::debug;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

static TRAILING_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}\s*$").unwrap());

#[derive(Debug, Deserialize)]
struct MessageResponse {
    banker_message: String,
}

/// Pulls the trailing JSON object out of a model reply, skipping any
/// preamble or reasoning text before it.
pub fn extract_json_block(raw: &str) -> Result<&str> {
    TRAILING_JSON
        .find(raw)
        .map(|m| m.as_str().trim_end())
        .ok_or_else(|| AdvisorError::LlmError("No valid JSON in LLM response.".to_string()))
}

pub fn parse_banker_message(raw: &str) -> Result<String> {
    let parsed: MessageResponse = serde_json::from_str(extract_json_block(raw)?)?;
    let message = parsed.banker_message.trim();
    if message.is_empty() {
        return Err(AdvisorError::LlmError("Model returned an empty banker_message".to_string()));
    }
    Ok(message.to_string())
}

/// Narrator backed by a local Ollama model. Owns a single-threaded runtime so
/// the batch loop stays synchronous.
pub struct OllamaNarrator {
    client: OllamaClient,
    config: AdvisorConfig,
    runtime: tokio::runtime::Runtime,
}

impl OllamaNarrator {
    pub fn new(config: AdvisorConfig) -> Result<Self> {
        let client = OllamaClient::new(&config.ollama)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }
}

impl Narrator for OllamaNarrator {
    fn narrate(&self, report: &InterestReport) -> Result<String> {
        let prompt = build_prompt(report, &self.config)?;
        debug!(
            "Asking {} for a message for customer {}",
            self.client.model(),
            report.customer_id
        );
        let raw = self.runtime.block_on(self.client.generate(&prompt))?;
        parse_banker_message(&raw)
    }
}
