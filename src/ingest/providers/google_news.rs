// src/ingest/providers/google_news.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;

use crate::config::SearchConfig;
use crate::ingest::normalize_text;
use crate::ingest::types::{RawItem, SearchProvider, SearchQuery};

const GOOGLE_NEWS_RSS_URL: &str = "https://news.google.com/rss/search";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

/// Google News RSS search. The feed has no sort parameter; results come back
/// in the feed's own order and are truncated to `display`.
pub struct GoogleNewsProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        client: reqwest::Client,
        language: String,
        country: String,
    },
}

impl GoogleNewsProvider {
    pub fn from_fixture(xml: &str) -> Self {
        Self {
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_config(cfg: &SearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; news-briefing/0.1)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(cfg.request_timeout())
            .build()
            .context("building google news http client")?;
        Ok(Self {
            mode: Mode::Http {
                client,
                language: cfg.language.clone(),
                country: cfg.country.clone(),
            },
        })
    }

    fn parse_items_from_str(s: &str, limit: usize) -> Result<Vec<RawItem>> {
        let t0 = std::time::Instant::now();
        let rss: Rss = from_str(s).context("parsing google news rss xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len().min(limit));
        for it in rss.channel.item.into_iter().take(limit) {
            let title = normalize_text(it.title.as_deref().unwrap_or_default());
            if title.is_empty() {
                continue;
            }
            out.push(RawItem {
                title,
                // descriptions are HTML link lists; normalize_text strips the markup
                description: normalize_text(it.description.as_deref().unwrap_or_default()),
                link: it.link.unwrap_or_default().trim().to_string(),
                pub_date: it.pub_date,
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_parse_ms").record(ms);
        Ok(out)
    }
}

#[async_trait]
impl SearchProvider for GoogleNewsProvider {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawItem>> {
        let limit = query.display.max(1) as usize;
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s, limit),
            Mode::Http {
                client,
                language,
                country,
            } => {
                let ceid = format!("{country}:{language}");
                let resp = client
                    .get(GOOGLE_NEWS_RSS_URL)
                    .query(&[
                        ("q", query.query.as_str()),
                        ("hl", language.as_str()),
                        ("gl", country.as_str()),
                        ("ceid", ceid.as_str()),
                    ])
                    .send()
                    .await
                    .context("google news http get()")?;

                let status = resp.status();
                if !status.is_success() {
                    counter!("ingest_provider_http_errors_total").increment(1);
                    return Err(anyhow!("google news returned status {status}"));
                }
                let body = resp.text().await.context("google news http .text()")?;
                Self::parse_items_from_str(&body, limit)
            }
        }
    }

    fn name(&self) -> &'static str {
        "google_news"
    }
}
