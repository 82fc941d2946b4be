// src/ingest/recency.rs
//! Lookback-window filter on provider publish dates.
//!
//! What to do with a missing or malformed date is a policy decision, not an
//! accident of the parser: `DateParsePolicy::Drop` (default) rejects such items,
//! `DateParsePolicy::Keep` lets them through undated.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateParsePolicy {
    /// Fail closed: undated items are rejected.
    #[default]
    Drop,
    /// Fail open: undated items are treated as fresh.
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh(DateTime<Utc>),
    Stale(DateTime<Utc>),
    /// Date missing or unparseable.
    Undated,
}

#[derive(Debug, Clone, Copy)]
pub struct RecencyFilter {
    window: Duration,
    policy: DateParsePolicy,
}

impl RecencyFilter {
    pub fn new(window: Duration, policy: DateParsePolicy) -> Self {
        Self { window, policy }
    }

    pub fn policy(&self) -> DateParsePolicy {
        self.policy
    }

    /// Classify a provider date string against `now`. The boundary is inclusive.
    pub fn check(&self, pub_date: Option<&str>, now: DateTime<Utc>) -> Freshness {
        match pub_date.and_then(parse_pub_date) {
            None => Freshness::Undated,
            Some(ts) if now.signed_duration_since(ts) <= self.window => Freshness::Fresh(ts),
            Some(ts) => Freshness::Stale(ts),
        }
    }

    /// Apply the policy: `Some(published_at)` when the item is kept.
    pub fn admit(&self, freshness: Freshness) -> Option<Option<DateTime<Utc>>> {
        match freshness {
            Freshness::Fresh(ts) => Some(Some(ts)),
            Freshness::Stale(_) => None,
            Freshness::Undated => match self.policy {
                DateParsePolicy::Keep => Some(None),
                DateParsePolicy::Drop => None,
            },
        }
    }

    pub fn keeps(&self, pub_date: Option<&str>, now: DateTime<Utc>) -> bool {
        self.admit(self.check(pub_date, now)).is_some()
    }
}

/// Parse a provider date: RFC 2822 (both providers), obsolete zone names, RFC 3339.
pub fn parse_pub_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc2822) {
        return DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), dt.nanosecond());
    }
    // chrono also accepts "GMT"/"UT" and friends
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), dt.nanosecond());
    }
    None
}
