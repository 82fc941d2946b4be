// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::resolve_secret;

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftingConfig {
    /// "gemini" | "openai" | "mock" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Provider default is used when absent.
    #[serde(default)]
    pub model: Option<String>,
    /// "ENV" means: read from GEMINI_API_KEY / OPENAI_API_KEY (by provider)
    #[serde(default = "env_placeholder")]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Override for the provider endpoint (proxies, tests).
    #[serde(default)]
    pub base_url: Option<String>,
}

fn env_placeholder() -> String {
    "ENV".to_string()
}

impl Default for DraftingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            api_key: env_placeholder(),
            timeout_secs: default_timeout_secs(),
            base_url: None,
        }
    }
}

impl DraftingConfig {
    pub fn provider_normalized(&self) -> String {
        self.provider.trim().to_lowercase()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Resolve the API key, honoring the "ENV" placeholder per provider.
    pub fn resolved_api_key(&self) -> anyhow::Result<String> {
        match self.provider_normalized().as_str() {
            "gemini" => resolve_secret(&self.api_key, "GEMINI_API_KEY"),
            "openai" => resolve_secret(&self.api_key, "OPENAI_API_KEY"),
            "mock" => Ok(String::new()),
            other => anyhow::bail!("Unsupported drafting provider in config: {other}"),
        }
    }
}
