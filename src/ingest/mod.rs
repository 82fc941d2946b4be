// src/ingest/mod.rs
pub mod dedup;
pub mod providers;
pub mod recency;
pub mod types;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use std::time::Duration;
use tokio::time::Instant;

use crate::basket::{Basket, BasketAssembler, BasketSpec};
use crate::config::BriefingConfig;
use crate::ingest::dedup::{DedupVerdict, NearDuplicateDetector};
use crate::ingest::recency::{Freshness, RecencyFilter};
use crate::ingest::types::{NewsItem, RawItem, SearchProvider, SearchQuery, SortOrder};

/// One-time metrics registration (so series carry descriptions once a recorder exists).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_items_fetched_total",
            "Raw items returned by the search provider."
        );
        describe_counter!("ingest_kept_total", "Items attributed to a basket.");
        describe_counter!("ingest_stale_total", "Items outside the lookback window.");
        describe_counter!(
            "ingest_undated_total",
            "Items with a missing or unparseable publish date."
        );
        describe_counter!("ingest_noise_total", "Items dropped by the noise-word filter.");
        describe_counter!(
            "ingest_dedup_total",
            "Items dropped as duplicate link or similar title."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Keyword fetches that failed, timed out or were skipped."
        );
        describe_histogram!("ingest_parse_ms", "Provider parse time in milliseconds.");
        describe_gauge!(
            "pipeline_last_run_ts",
            "Unix ts when the ingest pipeline last ran."
        );
    });
}

/// Normalize provider text: decode entities, strip tags, fold quotes and whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags (search APIs wrap matched terms in <b>)
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// True when the title or description contains any noise word (promotions, events).
pub fn is_noise<S: AsRef<str>>(title: &str, description: &str, noise_words: &[S]) -> bool {
    noise_words.iter().any(|w| {
        let w = w.as_ref();
        !w.is_empty() && (title.contains(w) || description.contains(w))
    })
}

/// Per-run counters, also mirrored into `metrics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub keywords: usize,
    pub provider_errors: usize,
    pub fetched: usize,
    pub noise: usize,
    pub stale: usize,
    pub undated: usize,
    pub duplicate_links: usize,
    pub similar_titles: usize,
    pub kept: usize,
}

impl IngestStats {
    pub fn deduplicated(&self) -> usize {
        self.duplicate_links + self.similar_titles
    }

    fn publish(&self) {
        counter!("ingest_items_fetched_total").increment(self.fetched as u64);
        counter!("ingest_kept_total").increment(self.kept as u64);
        counter!("ingest_stale_total").increment(self.stale as u64);
        counter!("ingest_undated_total").increment(self.undated as u64);
        counter!("ingest_noise_total").increment(self.noise as u64);
        counter!("ingest_dedup_total").increment(self.deduplicated() as u64);
        counter!("ingest_provider_errors_total").increment(self.provider_errors as u64);
    }
}

/// Everything the ingest phase needs, resolved from `BriefingConfig` once.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub display: u32,
    pub sort: SortOrder,
    pub per_call_timeout: Duration,
    pub run_deadline: Duration,
    pub recency: RecencyFilter,
    pub similarity_threshold: f64,
    pub noise_words: Vec<String>,
}

impl IngestSettings {
    pub fn from_config(cfg: &BriefingConfig) -> Self {
        Self {
            display: cfg.search.display,
            sort: cfg.search.sort,
            per_call_timeout: cfg.search.request_timeout(),
            run_deadline: cfg.search.run_deadline(),
            recency: RecencyFilter::new(cfg.filter.lookback(), cfg.filter.date_parse_policy),
            similarity_threshold: cfg.filter.similarity_threshold,
            noise_words: cfg.filter.noise_words.clone(),
        }
    }
}

/// Noise -> recency -> duplicate checks for a single candidate stream.
pub struct CandidateFilter<'a> {
    settings: &'a IngestSettings,
    detector: NearDuplicateDetector,
    now: DateTime<Utc>,
}

impl<'a> CandidateFilter<'a> {
    pub fn new(settings: &'a IngestSettings, now: DateTime<Utc>) -> Self {
        Self {
            settings,
            detector: NearDuplicateDetector::new(settings.similarity_threshold),
            now,
        }
    }

    pub fn admit(&mut self, raw: RawItem, stats: &mut IngestStats) -> Option<NewsItem> {
        if is_noise(&raw.title, &raw.description, &self.settings.noise_words) {
            stats.noise += 1;
            return None;
        }

        let freshness = self.settings.recency.check(raw.pub_date.as_deref(), self.now);
        match freshness {
            Freshness::Stale(_) => stats.stale += 1,
            Freshness::Undated => stats.undated += 1,
            Freshness::Fresh(_) => {}
        }
        let published_at = self.settings.recency.admit(freshness)?;

        match self.detector.check_and_insert(&raw.link, &raw.title) {
            DedupVerdict::Accepted => {}
            DedupVerdict::DuplicateLink => {
                stats.duplicate_links += 1;
                return None;
            }
            DedupVerdict::SimilarTitle { similarity } => {
                tracing::debug!(target: "ingest", title = %raw.title, similarity, "near-duplicate title");
                stats.similar_titles += 1;
                return None;
            }
        }

        stats.kept += 1;
        Some(NewsItem {
            title: raw.title,
            description: raw.description,
            link: raw.link,
            published_at,
        })
    }
}

/// Pure filtering + assembly over already fetched batches of `(basket_index, items)`,
/// in fetch order.
pub fn filter_and_assemble(
    now: DateTime<Utc>,
    specs: &[BasketSpec],
    batches: Vec<(usize, Vec<RawItem>)>,
    settings: &IngestSettings,
) -> (Vec<Basket>, IngestStats) {
    let mut stats = IngestStats::default();
    let mut filter = CandidateFilter::new(settings, now);
    let mut assembler = BasketAssembler::new(specs);
    for (basket_index, raw_items) in batches {
        stats.fetched += raw_items.len();
        for raw in raw_items {
            if let Some(item) = filter.admit(raw, &mut stats) {
                assembler.push(basket_index, item);
            }
        }
    }
    (assembler.finish(), stats)
}

/// Single attempt for one keyword. Errors and timeouts become an empty result.
pub async fn fetch_keyword(
    provider: &dyn SearchProvider,
    query: &SearchQuery,
    timeout: Duration,
) -> Option<Vec<RawItem>> {
    match tokio::time::timeout(timeout, provider.search(query)).await {
        Ok(Ok(items)) => Some(items),
        Ok(Err(e)) => {
            tracing::warn!(target: "ingest", error = ?e, provider = provider.name(), keyword = %query.query, "provider error");
            None
        }
        Err(_) => {
            tracing::warn!(target: "ingest", provider = provider.name(), keyword = %query.query, timeout_ms = timeout.as_millis() as u64, "provider call timed out");
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub baskets: Vec<Basket>,
    pub stats: IngestStats,
}

impl IngestOutcome {
    pub fn total_items(&self) -> usize {
        crate::basket::total_items(&self.baskets)
    }
}

/// Fetch every keyword of every basket in order, filter, and assemble baskets.
pub async fn run_once(
    provider: &dyn SearchProvider,
    specs: &[BasketSpec],
    settings: &IngestSettings,
    now: DateTime<Utc>,
) -> IngestOutcome {
    ensure_metrics_described();

    let deadline = Instant::now() + settings.run_deadline;
    let mut stats = IngestStats::default();
    let mut filter = CandidateFilter::new(settings, now);
    let mut assembler = BasketAssembler::new(specs);

    for (basket_index, spec) in specs.iter().enumerate() {
        let before = assembler.total_items();
        for keyword in &spec.keywords {
            stats.keywords += 1;

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!(target: "ingest", keyword = %keyword, "run deadline passed, keyword skipped");
                stats.provider_errors += 1;
                continue;
            }

            let query = SearchQuery {
                query: keyword.clone(),
                display: settings.display,
                sort: settings.sort,
            };
            let Some(raw_items) =
                fetch_keyword(provider, &query, remaining.min(settings.per_call_timeout)).await
            else {
                stats.provider_errors += 1;
                continue;
            };

            stats.fetched += raw_items.len();
            for raw in raw_items {
                if let Some(item) = filter.admit(raw, &mut stats) {
                    assembler.push(basket_index, item);
                }
            }
        }
        tracing::info!(
            target: "ingest",
            basket = %spec.name,
            kept = assembler.total_items() - before,
            "basket collected"
        );
    }

    stats.publish();
    gauge!("pipeline_last_run_ts").set(now.timestamp().max(0) as f64);
    tracing::info!(
        target: "ingest",
        keywords = stats.keywords,
        fetched = stats.fetched,
        kept = stats.kept,
        stale = stats.stale,
        undated = stats.undated,
        noise = stats.noise,
        dedup = stats.deduplicated(),
        provider_errors = stats.provider_errors,
        "ingest finished"
    );

    IngestOutcome {
        baskets: assembler.finish(),
        stats,
    }
}
