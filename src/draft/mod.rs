//! Drafting collaborator: turns baskets + novelty directive into report prose.
//! Provider abstraction mirrors the rest of the crate: a small trait, concrete
//! HTTP providers, and a fixed-text mock for local runs and tests.

pub mod gemini;
pub mod openai;

use anyhow::{bail, Result};
use std::fmt::Write as _;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::basket::Basket;
use crate::config::DraftingConfig;
use crate::novelty::{ordered_baskets, NoveltyDirective};

pub use gemini::GeminiDrafter;
pub use openai::OpenAiDrafter;

pub const DEFAULT_MAX_ITEMS_PER_BASKET: usize = 100;

/// Everything the drafting step receives.
#[derive(Debug, Clone)]
pub struct DraftRequest {
    pub baskets: Vec<Basket>,
    pub directive: NoveltyDirective,
    pub max_items_per_basket: usize,
}

pub type DraftFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

pub trait Drafter: Send + Sync {
    /// Produce report text from the rendered request.
    fn draft<'a>(&'a self, request: &'a DraftRequest) -> DraftFuture<'a>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynDrafter = Arc<dyn Drafter>;

/// Factory: build a drafter according to config (and environment for secrets).
pub fn build_drafter(cfg: &DraftingConfig) -> Result<DynDrafter> {
    match cfg.provider_normalized().as_str() {
        "gemini" => Ok(Arc::new(GeminiDrafter::from_config(cfg)?)),
        "openai" => Ok(Arc::new(OpenAiDrafter::from_config(cfg)?)),
        "mock" => Ok(Arc::new(MockDrafter::new(
            "Mock briefing: drafting provider is set to \"mock\".",
        ))),
        other => bail!("Unsupported drafting provider: {other}"),
    }
}

/// Render the request into a single prompt. Articles are numbered globally in
/// directive basket order so citations stay stable.
pub fn build_prompt(request: &DraftRequest) -> String {
    let mut out = String::new();
    out.push_str(
        "You are preparing a recurring policy briefing from the news items below.\n\
         Cite every factual claim with its article number, e.g. [3].\n\
         Merge reports of the same event into a single issue.\n\n",
    );

    out.push_str("[SELECTION RULES]\n");
    out.push_str(&request.directive.render_instructions());
    out.push('\n');

    if request.directive.has_history() {
        out.push_str("[PREVIOUS REPORTS, newest first]\n");
        for (idx, record) in request.directive.history.iter().enumerate() {
            let _ = writeln!(
                out,
                "==== previous report {} ({}) ====",
                idx + 1,
                record.created_at.format("%Y-%m-%d %H:%M UTC")
            );
            out.push_str(record.content.trim_end());
            out.push('\n');
        }
        out.push_str("==== end of previous reports ====\n\n");
    }

    out.push_str("[COLLECTED ARTICLES]\n");
    let mut article_no = 1;
    for basket in ordered_baskets(&request.baskets) {
        let _ = writeln!(out, "\n### Basket: {}", basket.name);
        if basket.is_empty() {
            out.push_str("(no articles)\n");
            continue;
        }
        for item in basket.items.iter().take(request.max_items_per_basket) {
            let _ = writeln!(out, "- [{article_no}] {}", item.title);
            if !item.description.is_empty() {
                let _ = writeln!(out, "  summary: {}", item.description);
            }
            let _ = writeln!(out, "  link: {}", item.link);
            if let Some(ts) = item.published_at {
                let _ = writeln!(out, "  published: {}", ts.to_rfc3339());
            }
            article_no += 1;
        }
    }
    out
}

/// Returns the same text for every request.
#[derive(Debug, Clone)]
pub struct MockDrafter {
    pub fixed: String,
}

impl MockDrafter {
    pub fn new<S: Into<String>>(fixed: S) -> Self {
        Self {
            fixed: fixed.into(),
        }
    }
}

impl Drafter for MockDrafter {
    fn draft<'a>(&'a self, _request: &'a DraftRequest) -> DraftFuture<'a> {
        let out = self.fixed.clone();
        Box::pin(async move { Ok(out) })
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
