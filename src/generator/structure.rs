//! Page structure analysis
//!
//! A single heavy-model request summarizes the page before its sections are
//! regenerated, so every section sees the same picture of the whole.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::ai::{CompletionClient, PromptTemplates};
use crate::constants::generation as gen_constants;
use crate::types::{ForgeError, Result};

/// Model-produced summary of a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureSummary {
    pub main_sections: Vec<Value>,
    pub key_components: Vec<Value>,
    pub critical_functionality: Vec<Value>,
    pub dependencies: Vec<Value>,
}

impl StructureSummary {
    pub fn is_empty(&self) -> bool {
        self.main_sections.is_empty()
            && self.key_components.is_empty()
            && self.critical_functionality.is_empty()
            && self.dependencies.is_empty()
    }

    /// Pretty JSON embedded in section prompts
    pub fn to_context_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Parse a summary out of a model reply
    ///
    /// Tries the whole reply, then a ```json block, then the outermost braces.
    pub fn parse_reply(reply: &str) -> Result<Self> {
        let trimmed = reply.trim();

        if let Ok(summary) = serde_json::from_str::<Self>(trimmed) {
            return Ok(summary);
        }

        if let Some(block) = fenced_json(trimmed)
            && let Ok(summary) = serde_json::from_str::<Self>(&block)
        {
            return Ok(summary);
        }

        let start = trimmed.find('{');
        let end = trimmed.rfind('}');
        match (start, end) {
            (Some(start), Some(end)) if start < end => {
                Ok(serde_json::from_str::<Self>(&trimmed[start..=end])?)
            }
            _ => Err(ForgeError::generation(
                "structure analysis",
                "reply contains no JSON object",
            )),
        }
    }
}

fn fenced_json(text: &str) -> Option<String> {
    let body = text.split_once("```json")?.1;
    let end = body.find("```")?;
    Some(body[..end].trim().to_string())
}

/// Runs the structure analysis request
pub struct StructureAnalyzer {
    client: Arc<CompletionClient>,
    model: String,
}

impl StructureAnalyzer {
    pub fn new(client: Arc<CompletionClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Summarize `html`; an empty summary counts as a failure
    pub async fn analyze(&self, html: &str) -> Result<StructureSummary> {
        let prompt = PromptTemplates::structure_analysis(html);
        let reply = self
            .client
            .generate(&prompt, &self.model, gen_constants::STRUCTURE_MAX_TOKENS)
            .await?;

        let summary = StructureSummary::parse_reply(&reply).inspect_err(|e| {
            warn!(error = %e, "Structure analysis reply was not valid JSON");
        })?;

        if summary.is_empty() {
            return Err(ForgeError::generation(
                "structure analysis",
                "summary is empty",
            ));
        }

        info!(
            sections = summary.main_sections.len(),
            components = summary.key_components.len(),
            "Analyzed page structure"
        );
        Ok(summary)
    }
}
