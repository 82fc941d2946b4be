// src/ingest/providers/mod.rs
pub mod google_news;
pub mod naver;

use anyhow::Result;

use crate::config::{SearchConfig, SearchProviderKind};
use crate::ingest::types::SearchProvider;

/// Build the configured search provider (HTTP mode).
pub fn build_provider(cfg: &SearchConfig) -> Result<Box<dyn SearchProvider>> {
    Ok(match cfg.provider {
        SearchProviderKind::Naver => Box::new(naver::NaverNewsProvider::from_config(cfg)?),
        SearchProviderKind::GoogleNews => {
            Box::new(google_news::GoogleNewsProvider::from_config(cfg)?)
        }
    })
}
