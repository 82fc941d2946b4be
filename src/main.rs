//! news-briefing: binary entrypoint.
//! One invocation is one batch run; scheduling is left to cron or a CI timer.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_briefing::config::BriefingConfig;
use news_briefing::draft::build_drafter;
use news_briefing::history::HistoryStore;
use news_briefing::ingest::providers::build_provider;
use news_briefing::notify::{EmailSender, LogDelivery, ReportDelivery};
use news_briefing::pipeline::{basket_counts, resend_latest, Pipeline, RunOutcome};

#[derive(Debug, Parser)]
#[command(name = "news-briefing", version, about = "Keyword news crawl and briefing mailer")]
struct Cli {
    /// Config file (default: $BRIEFING_CONFIG_PATH, then config/briefing.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit JSON log lines instead of the compact format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Full pipeline: fetch, filter, draft, store, deliver
    Run {
        /// Log the report instead of emailing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Re-deliver the newest stored report
    Resend,
    /// List retained reports, newest first
    History {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Fetch and filter only; print per-basket counts
    Collect,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<BriefingConfig> {
    let cfg = match path {
        Some(p) => BriefingConfig::load_from(p)?,
        None => BriefingConfig::load_default()?,
    };
    cfg.validate()?;
    Ok(cfg)
}

fn build_delivery(cfg: &BriefingConfig, dry_run: bool) -> Result<Box<dyn ReportDelivery>> {
    if dry_run || !cfg.email.enabled {
        return Ok(Box::new(LogDelivery));
    }
    Ok(Box::new(
        EmailSender::from_config(&cfg.email).context("configuring email delivery")?,
    ))
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let cfg = load_config(cli.config.as_ref())?;
    let history = HistoryStore::open(&cfg.history.dir, cfg.history.retention)?;

    match cli.command {
        Command::Run { dry_run } => {
            let provider = build_provider(&cfg.search)?;
            let drafter = build_drafter(&cfg.drafting)?;
            let delivery = build_delivery(&cfg, dry_run)?;
            let pipeline = Pipeline {
                config: &cfg,
                provider: provider.as_ref(),
                drafter: drafter.as_ref(),
                delivery: delivery.as_ref(),
                history: &history,
            };
            match pipeline.run(Utc::now()).await? {
                RunOutcome::NoItems { .. } => {
                    tracing::warn!(target: "pipeline", "run finished without collected items");
                    Ok(ExitCode::SUCCESS)
                }
                RunOutcome::Completed {
                    report, delivered, ..
                } => {
                    if delivered {
                        tracing::info!(target: "pipeline", created_at = %report.created_at, "run completed");
                        Ok(ExitCode::SUCCESS)
                    } else {
                        tracing::error!(
                            target: "pipeline",
                            created_at = %report.created_at,
                            "report stored but not delivered; retry with `news-briefing resend`"
                        );
                        Ok(ExitCode::FAILURE)
                    }
                }
            }
        }
        Command::Resend => {
            let delivery = build_delivery(&cfg, false)?;
            match resend_latest(&history, delivery.as_ref()).await? {
                Some((_, true)) => Ok(ExitCode::SUCCESS),
                Some((_, false)) => Ok(ExitCode::FAILURE),
                None => {
                    println!("no stored report in {}", history.dir().display());
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::History { limit } => {
            for rec in history.get_recent(limit)? {
                println!(
                    "{}  {:>7} chars  {}",
                    rec.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                    rec.content.chars().count(),
                    rec.content.lines().next().unwrap_or_default()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Collect => {
            let provider = build_provider(&cfg.search)?;
            let settings = news_briefing::ingest::IngestSettings::from_config(&cfg);
            let outcome =
                news_briefing::ingest::run_once(provider.as_ref(), &cfg.baskets, &settings, Utc::now())
                    .await;
            for (name, count) in basket_counts(&outcome.baskets) {
                println!("{name:<24} {count:>4}");
            }
            println!("{:<24} {:>4}", "total", outcome.total_items());
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = ?e, "news-briefing failed");
            ExitCode::FAILURE
        }
    }
}
