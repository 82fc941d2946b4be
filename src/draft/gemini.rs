// src/draft/gemini.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{build_prompt, DraftFuture, DraftRequest, Drafter};
use crate::config::DraftingConfig;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// Gemini `generateContent` provider. Requires `GEMINI_API_KEY` (or a literal key).
pub struct GeminiDrafter {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}
#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}
#[derive(Serialize)]
struct Req<'a> {
    contents: Vec<Content<'a>>,
}
#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    candidates: Vec<Candidate>,
}
#[derive(Deserialize)]
struct Candidate {
    content: Option<RespContent>,
}
#[derive(Deserialize)]
struct RespContent {
    #[serde(default)]
    parts: Vec<RespPart>,
}
#[derive(Deserialize)]
struct RespPart {
    #[serde(default)]
    text: String,
}

impl GeminiDrafter {
    pub fn from_config(cfg: &DraftingConfig) -> Result<Self> {
        let api_key = cfg.resolved_api_key()?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("news-briefing/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(cfg.timeout())
            .build()
            .context("building gemini http client")?;
        Ok(Self {
            http,
            api_key,
            model: cfg.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: cfg
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    async fn draft_impl(&self, request: &DraftRequest) -> Result<String> {
        let prompt = build_prompt(request);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let body = Req {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: &prompt }],
            }],
        };

        tracing::info!(target: "draft", provider = "gemini", model = %self.model, prompt_chars = prompt.chars().count(), "requesting draft");
        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .context("sending gemini request")?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            bail!("gemini API error {status}: {error_text}");
        }

        let parsed: Resp = resp.json().await.context("parsing gemini response")?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(anyhow!("gemini returned an empty draft"));
        }
        Ok(text)
    }
}

impl Drafter for GeminiDrafter {
    fn draft<'a>(&'a self, request: &'a DraftRequest) -> DraftFuture<'a> {
        Box::pin(self.draft_impl(request))
    }
    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}
