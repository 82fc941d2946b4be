// tests/basket_assembly.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::time::Duration;

use news_briefing::config::BriefingConfig;
use news_briefing::ingest::types::{RawItem, SearchProvider, SearchQuery};
use news_briefing::ingest::{run_once, IngestSettings};
use news_briefing::{BasketPriority, BasketSpec};

/// Answers from a fixed keyword table; unknown keywords return nothing.
struct TableProvider {
    table: HashMap<&'static str, Vec<RawItem>>,
    failing: Vec<&'static str>,
    slow: Vec<&'static str>,
}

#[async_trait]
impl SearchProvider for TableProvider {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawItem>> {
        if self.failing.iter().any(|k| *k == query.query) {
            return Err(anyhow!("HTTP 500 for {}", query.query));
        }
        if self.slow.iter().any(|k| *k == query.query) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        Ok(self.table.get(query.query.as_str()).cloned().unwrap_or_default())
    }
    fn name(&self) -> &'static str {
        "table"
    }
}

fn raw(title: &str, link: &str) -> RawItem {
    RawItem {
        title: title.to_string(),
        description: format!("{title} (summary)"),
        link: link.to_string(),
        pub_date: Some("Sat, 17 Oct 2026 02:00:00 +0000".to_string()),
    }
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
}

fn settings() -> IngestSettings {
    let mut s = IngestSettings::from_config(&BriefingConfig::default());
    s.per_call_timeout = Duration::from_millis(200);
    s
}

#[tokio::test]
async fn basket_without_results_is_present_and_empty() {
    let provider = TableProvider {
        table: HashMap::from([("x", vec![raw("Audit ordered at sports council", "https://n.test/1")])]),
        failing: vec![],
        slow: vec![],
    };
    let specs = vec![
        BasketSpec::new("A", BasketPriority::Primary, &["x"]),
        BasketSpec::new("B", BasketPriority::Secondary, &["y"]),
    ];
    let out = run_once(&provider, &specs, &settings(), now()).await;

    assert_eq!(out.baskets.len(), 2);
    assert_eq!(out.baskets[0].name, "A");
    assert_eq!(out.baskets[0].len(), 1);
    assert_eq!(out.baskets[1].name, "B");
    assert!(out.baskets[1].is_empty());
    assert_eq!(out.total_items(), 1);
}

#[tokio::test]
async fn failing_keyword_does_not_block_the_others() {
    let provider = TableProvider {
        table: HashMap::from([
            ("ok-1", vec![raw("Copyright trust accounts questioned", "https://n.test/1")]),
            ("ok-2", vec![raw("Doping sanctions for federation officials", "https://n.test/2")]),
        ]),
        failing: vec!["boom"],
        slow: vec![],
    };
    let specs = vec![BasketSpec::new("A", BasketPriority::Primary, &["ok-1", "boom", "ok-2"])];
    let out = run_once(&provider, &specs, &settings(), now()).await;

    assert_eq!(out.baskets[0].len(), 2);
    assert_eq!(out.stats.provider_errors, 1);
    assert_eq!(out.stats.keywords, 3);
}

#[tokio::test]
async fn slow_keyword_times_out_and_counts_as_error() {
    let provider = TableProvider {
        table: HashMap::from([("fast", vec![raw("Tourism tax debate resumes", "https://n.test/9")])]),
        failing: vec![],
        slow: vec!["slow"],
    };
    let specs = vec![BasketSpec::new("A", BasketPriority::Primary, &["slow", "fast"])];
    let out = run_once(&provider, &specs, &settings(), now()).await;

    assert_eq!(out.baskets[0].len(), 1);
    assert_eq!(out.stats.provider_errors, 1);
}

#[tokio::test]
async fn duplicates_across_baskets_stay_with_the_first_basket() {
    let shared = raw("Game rating board audit published", "https://n.test/shared");
    let provider = TableProvider {
        table: HashMap::from([
            ("x", vec![shared.clone()]),
            ("y", vec![shared, raw("Webtoon contract template revised", "https://n.test/w")]),
        ]),
        failing: vec![],
        slow: vec![],
    };
    let specs = vec![
        BasketSpec::new("A", BasketPriority::Primary, &["x"]),
        BasketSpec::new("B", BasketPriority::Secondary, &["y"]),
    ];
    let out = run_once(&provider, &specs, &settings(), now()).await;

    assert_eq!(out.baskets[0].items[0].link, "https://n.test/shared");
    assert_eq!(out.baskets[1].len(), 1);
    assert_eq!(out.baskets[1].items[0].link, "https://n.test/w");
    assert_eq!(out.stats.duplicate_links, 1);
}

#[tokio::test]
async fn items_keep_fetch_order_within_a_basket() {
    let provider = TableProvider {
        table: HashMap::from([
            ("k1", vec![raw("First: heritage assessment ordered", "https://n.test/1")]),
            ("k2", vec![raw("Second: museum safety inspection", "https://n.test/2")]),
        ]),
        failing: vec![],
        slow: vec![],
    };
    let specs = vec![BasketSpec::new("A", BasketPriority::Primary, &["k1", "k2"])];
    let out = run_once(&provider, &specs, &settings(), now()).await;
    let links: Vec<_> = out.baskets[0].items.iter().map(|i| i.link.as_str()).collect();
    assert_eq!(links, vec!["https://n.test/1", "https://n.test/2"]);
    assert!(out.baskets[0].items[0].published_at.is_some());
}
