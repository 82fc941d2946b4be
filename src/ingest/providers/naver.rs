// src/ingest/providers/naver.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;
use std::time::Duration;

use crate::config::{resolve_secret, SearchConfig};
use crate::ingest::normalize_text;
use crate::ingest::types::{RawItem, SearchProvider, SearchQuery, SortOrder};

const NAVER_NEWS_URL: &str = "https://openapi.naver.com/v1/search/news.json";

#[derive(Debug, Deserialize)]
struct NaverResponse {
    #[serde(default)]
    items: Vec<NaverItem>,
}

#[derive(Debug, Deserialize)]
struct NaverItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    originallink: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

/// Naver News Search API provider.
pub struct NaverNewsProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        client: reqwest::Client,
        client_id: String,
        client_secret: String,
    },
}

impl NaverNewsProvider {
    /// Serve every query from the same JSON body.
    pub fn from_fixture(body: &str) -> Self {
        Self {
            mode: Mode::Fixture(body.to_string()),
        }
    }

    pub fn from_config(cfg: &SearchConfig) -> Result<Self> {
        let client_id = resolve_secret(&cfg.client_id, "NAVER_CLIENT_ID")?;
        let client_secret = resolve_secret(&cfg.client_secret, "NAVER_CLIENT_SECRET")?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("news-briefing/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(cfg.request_timeout())
            .build()
            .context("building naver http client")?;
        Ok(Self {
            mode: Mode::Http {
                client,
                client_id,
                client_secret,
            },
        })
    }

    fn parse_items_from_str(s: &str) -> Result<Vec<RawItem>> {
        let t0 = std::time::Instant::now();
        let resp: NaverResponse = serde_json::from_str(s).context("parsing naver news json")?;

        let out: Vec<RawItem> = resp
            .items
            .into_iter()
            .map(|it| {
                let link = if it.originallink.trim().is_empty() {
                    it.link
                } else {
                    it.originallink
                };
                RawItem {
                    title: normalize_text(&it.title),
                    description: normalize_text(&it.description),
                    link: link.trim().to_string(),
                    pub_date: it.pub_date,
                }
            })
            .collect();

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_parse_ms").record(ms);
        Ok(out)
    }
}

fn sort_param(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::Date => "date",
        SortOrder::Relevance => "sim",
    }
}

#[async_trait]
impl SearchProvider for NaverNewsProvider {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawItem>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s),
            Mode::Http {
                client,
                client_id,
                client_secret,
            } => {
                let display = query.display.clamp(1, 100).to_string();
                let resp = client
                    .get(NAVER_NEWS_URL)
                    .header("X-Naver-Client-Id", client_id)
                    .header("X-Naver-Client-Secret", client_secret)
                    .query(&[
                        ("query", query.query.as_str()),
                        ("display", display.as_str()),
                        ("sort", sort_param(query.sort)),
                    ])
                    .send()
                    .await
                    .context("naver http get()")?;

                let status = resp.status();
                if !status.is_success() {
                    counter!("ingest_provider_http_errors_total").increment(1);
                    return Err(anyhow!("naver returned status {status}"));
                }
                let body = resp.text().await.context("naver http .text()")?;
                Self::parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "naver"
    }
}
