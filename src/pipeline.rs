//! pipeline.rs: one scheduled briefing run, end to end.
//!
//! fetch -> filter -> baskets -> novelty directive -> draft -> persist -> deliver.
//! The report is persisted before delivery, so a failed send can be retried with
//! [`resend_latest`].

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};

use crate::basket::Basket;
use crate::config::BriefingConfig;
use crate::draft::{DraftRequest, Drafter};
use crate::history::{HistoryStore, ReportRecord};
use crate::ingest::types::SearchProvider;
use crate::ingest::{self, IngestOutcome, IngestSettings, IngestStats};
use crate::notify::ReportDelivery;
use crate::novelty::NoveltyConstraintEngine;

#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Nothing survived filtering; drafting and delivery were skipped.
    NoItems { stats: IngestStats },
    Completed {
        report: ReportRecord,
        delivered: bool,
        stats: IngestStats,
    },
}

impl RunOutcome {
    pub fn stats(&self) -> &IngestStats {
        match self {
            RunOutcome::NoItems { stats } => stats,
            RunOutcome::Completed { stats, .. } => stats,
        }
    }

    pub fn delivered(&self) -> bool {
        matches!(self, RunOutcome::Completed { delivered: true, .. })
    }
}

/// Borrowed collaborators for a run. Built once per process by the binary, or
/// inline in tests with mock implementations.
pub struct Pipeline<'a> {
    pub config: &'a BriefingConfig,
    pub provider: &'a dyn SearchProvider,
    pub drafter: &'a dyn Drafter,
    pub delivery: &'a dyn ReportDelivery,
    pub history: &'a HistoryStore,
}

impl<'a> Pipeline<'a> {
    /// Fetch and filter only.
    pub async fn collect(&self, now: DateTime<Utc>) -> IngestOutcome {
        let settings = IngestSettings::from_config(self.config);
        ingest::run_once(self.provider, &self.config.baskets, &settings, now).await
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunOutcome> {
        let IngestOutcome { baskets, stats } = self.collect(now).await;

        if crate::basket::total_items(&baskets) == 0 {
            tracing::warn!(
                target: "pipeline",
                keywords = stats.keywords,
                provider_errors = stats.provider_errors,
                "no items collected; skipping drafting and delivery"
            );
            return Ok(RunOutcome::NoItems { stats });
        }

        let engine = NoveltyConstraintEngine::from_config(self.config);
        let directive = engine
            .build(&baskets, self.history)
            .context("reading report history")?;
        tracing::info!(
            target: "pipeline",
            history = directive.history.len(),
            tiers = directive.tiers.len(),
            "novelty directive built"
        );

        let request = DraftRequest {
            baskets,
            directive,
            max_items_per_basket: self.config.novelty.max_items_per_basket,
        };
        let text = self
            .drafter
            .draft(&request)
            .await
            .with_context(|| format!("drafting with {}", self.drafter.provider_name()))?;
        if text.trim().is_empty() {
            bail!("{} returned an empty draft", self.drafter.provider_name());
        }

        let saved = self.history.save_at(&text, Utc::now());
        if let Err(e) = &saved {
            tracing::error!(target: "pipeline", error = ?e, "saving report failed; delivering anyway");
        }

        let delivered = self.delivery.deliver(&text).await;
        if !delivered {
            tracing::error!(target: "pipeline", delivery = self.delivery.name(), "report delivery failed");
        }

        let report = saved.context("saving report to history")?;
        Ok(RunOutcome::Completed {
            report,
            delivered,
            stats,
        })
    }
}

/// Re-deliver the newest stored report. `Ok(None)` when history is empty.
pub async fn resend_latest(
    history: &HistoryStore,
    delivery: &dyn ReportDelivery,
) -> Result<Option<(ReportRecord, bool)>> {
    let Some(latest) = history.latest().context("reading latest report")? else {
        tracing::warn!(target: "pipeline", dir = %history.dir().display(), "no stored report to resend");
        return Ok(None);
    };
    tracing::info!(target: "pipeline", created_at = %latest.created_at, "resending latest report");
    let ok = delivery.deliver(&latest.content).await;
    Ok(Some((latest, ok)))
}

/// `(basket name, item count)` in configuration order, for summaries.
pub fn basket_counts(baskets: &[Basket]) -> Vec<(&str, usize)> {
    baskets.iter().map(|b| (b.name.as_str(), b.len())).collect()
}
