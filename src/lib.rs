// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod basket;
pub mod config;
pub mod draft;
pub mod history;
pub mod ingest;
pub mod notify;
pub mod novelty;
pub mod pipeline;

// ---- Re-exports for stable public API ----
pub use crate::basket::{Basket, BasketPriority, BasketSpec};
pub use crate::config::BriefingConfig;
pub use crate::history::{HistoryStore, ReportRecord};
pub use crate::ingest::types::{NewsItem, RawItem, SearchProvider, SearchQuery, SortOrder};
pub use crate::novelty::{NoveltyConstraintEngine, NoveltyDirective};
pub use crate::pipeline::{Pipeline, RunOutcome};
