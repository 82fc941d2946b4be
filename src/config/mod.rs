// src/config/mod.rs
//! Run configuration. Loaded once at startup and handed to every component
//! constructor by reference; nothing reads configuration from globals.

pub mod ai;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use crate::basket::BasketSpec;
use crate::ingest::recency::DateParsePolicy;
use crate::ingest::types::SortOrder;

pub use ai::DraftingConfig;

pub const ENV_CONFIG_PATH: &str = "BRIEFING_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/briefing.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BriefingConfig {
    pub search: SearchConfig,
    pub filter: FilterConfig,
    pub history: HistoryConfig,
    pub novelty: NoveltyConfig,
    pub drafting: DraftingConfig,
    pub email: EmailConfig,
    pub baskets: Vec<BasketSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchProviderKind {
    Naver,
    GoogleNews,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub provider: SearchProviderKind,
    /// Results requested per keyword (Naver caps this at 100).
    pub display: u32,
    pub sort: SortOrder,
    pub request_timeout_secs: u64,
    /// Upper bound for the whole fetch phase.
    pub run_deadline_secs: u64,
    /// "ENV" means: read from NAVER_CLIENT_ID
    pub client_id: String,
    /// "ENV" means: read from NAVER_CLIENT_SECRET
    pub client_secret: String,
    /// Google News locale (`hl` / `gl`).
    pub language: String,
    pub country: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: SearchProviderKind::Naver,
            display: 30,
            sort: SortOrder::Date,
            request_timeout_secs: 10,
            run_deadline_secs: 600,
            client_id: "ENV".to_string(),
            client_secret: "ENV".to_string(),
            language: "ko".to_string(),
            country: "KR".to_string(),
        }
    }
}

impl SearchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn run_deadline(&self) -> Duration {
        Duration::from_secs(self.run_deadline_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub lookback_hours: u64,
    /// Titles above this similarity to an accepted title are dropped.
    pub similarity_threshold: f64,
    pub date_parse_policy: DateParsePolicy,
    /// Items whose title or description contains any of these are dropped.
    pub noise_words: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            lookback_hours: 72,
            similarity_threshold: 0.6,
            date_parse_policy: DateParsePolicy::Drop,
            noise_words: Vec::new(),
        }
    }
}

impl FilterConfig {
    pub fn lookback(&self) -> chrono::Duration {
        // capped at ~100 years so the chrono constructor cannot overflow
        chrono::Duration::hours(self.lookback_hours.min(876_000) as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub dir: PathBuf,
    /// Maximum number of reports kept on disk.
    pub retention: usize,
    /// Number of recent reports handed to the drafting step.
    pub recent_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("history"),
            retention: 5,
            recent_limit: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoveltyConfig {
    /// Slot counts for tier 1, 2 and 3 (defaults: 1-5, 6-10, 11-20).
    pub tier_slots: [usize; 3],
    pub max_items_per_basket: usize,
}

impl Default for NoveltyConfig {
    fn default() -> Self {
        Self {
            tier_slots: [5, 5, 10],
            max_items_per_basket: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    /// "ENV" means: read from EMAIL_USER
    pub username: String,
    /// "ENV" means: read from EMAIL_PASSWORD
    pub password: String,
    /// Comma-separated list. "ENV" means: read from EMAIL_RECEIVERS
    pub receivers: String,
    /// Sender address; defaults to the SMTP username.
    pub from: Option<String>,
    pub subject: String,
    /// Offset used for the timestamp in the subject line.
    pub utc_offset_hours: i32,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 465,
            username: "ENV".to_string(),
            password: "ENV".to_string(),
            receivers: "ENV".to_string(),
            from: None,
            subject: "News Briefing".to_string(),
            utc_offset_hours: 9,
        }
    }
}

/// Resolve a config value that may be the literal `ENV` placeholder.
pub fn resolve_secret(value: &str, env_var: &str) -> Result<String> {
    if value.trim().eq_ignore_ascii_case("env") {
        let v = env::var(env_var).map_err(|_| anyhow!("Missing {env_var} env var"))?;
        if v.trim().is_empty() {
            bail!("{env_var} is set but empty");
        }
        Ok(v)
    } else {
        Ok(value.to_string())
    }
}

impl BriefingConfig {
    /// Load configuration from an explicit TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load configuration using env var + fallbacks:
    /// 1) $BRIEFING_CONFIG_PATH (must exist)
    /// 2) config/briefing.toml
    /// 3) built-in defaults (no baskets)
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        tracing::warn!(target: "config", "no config file found, using built-in defaults");
        Ok(Self::default())
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut cfg: BriefingConfig = toml::from_str(content)?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Clamp numeric knobs into their valid ranges instead of rejecting the file.
    pub fn sanitize(&mut self) {
        if !self.filter.similarity_threshold.is_finite() {
            self.filter.similarity_threshold = FilterConfig::default().similarity_threshold;
        }
        self.filter.similarity_threshold = self.filter.similarity_threshold.clamp(0.0, 1.0);
        self.search.display = self.search.display.clamp(1, 100);
        // A zero timeout would fail every fetch before it starts.
        self.search.request_timeout_secs = self.search.request_timeout_secs.max(1);
        self.search.run_deadline_secs = self.search.run_deadline_secs.max(1);
        self.history.retention = self.history.retention.max(1);
        self.history.recent_limit = self.history.recent_limit.min(self.history.retention);
        for spec in &mut self.baskets {
            spec.name = spec.name.trim().to_string();
            spec.keywords = spec
                .keywords
                .iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
        }
        self.filter.noise_words.retain(|w| !w.trim().is_empty());
    }

    /// Structural checks that cannot be repaired by `sanitize`.
    pub fn validate(&self) -> Result<()> {
        if self.baskets.is_empty() {
            bail!("no baskets configured; add at least one [[baskets]] entry");
        }
        let mut names = HashSet::new();
        for spec in &self.baskets {
            if spec.name.is_empty() {
                bail!("basket with empty name");
            }
            if !names.insert(spec.name.as_str()) {
                bail!("duplicate basket name: {}", spec.name);
            }
        }
        Ok(())
    }
}
