// src/ingest/dedup.rs
//! Run-wide duplicate suppression: exact link repeats and near-identical titles.
//!
//! - Candidates are processed in fetch order; the first-seen item wins.
//! - A candidate is compared against every *accepted* title, so the property holds
//!   transitively across the whole run, not just pairwise in the final set.
//! - Links are compared exactly, the empty link included: at most one item
//!   without a link survives a run.
//!
//! Similarity: `strsim::normalized_levenshtein` over lowercased titles (f64, 0..=1).
//!
//! Scaling limit: the title scan is O(n^2) in accepted items. Fine for a few hundred
//! items per run; past that, bucket titles first (shingling + approximate nearest
//! neighbour) and keep the first-seen-wins rule.

use std::collections::HashSet;
use strsim::normalized_levenshtein;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DedupVerdict {
    Accepted,
    DuplicateLink,
    SimilarTitle { similarity: f64 },
}

impl DedupVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, DedupVerdict::Accepted)
    }
}

/// Character-level, symmetric title similarity in `[0, 1]`.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    normalized_levenshtein(&a, &b)
}

#[derive(Debug, Clone)]
pub struct NearDuplicateDetector {
    threshold: f64,
    seen_links: HashSet<String>,
    accepted_titles: Vec<String>,
}

impl Default for NearDuplicateDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl NearDuplicateDetector {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            seen_links: HashSet::new(),
            accepted_titles: Vec::new(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted_titles.len()
    }

    /// Classify a candidate without recording it.
    pub fn check(&self, link: &str, title: &str) -> DedupVerdict {
        if self.seen_links.contains(link.trim()) {
            return DedupVerdict::DuplicateLink;
        }
        for seen in &self.accepted_titles {
            let similarity = title_similarity(title, seen);
            if similarity > self.threshold {
                return DedupVerdict::SimilarTitle { similarity };
            }
        }
        DedupVerdict::Accepted
    }

    /// Classify a candidate and record it when accepted.
    pub fn check_and_insert(&mut self, link: &str, title: &str) -> DedupVerdict {
        let verdict = self.check(link, title);
        if verdict.is_accepted() {
            self.seen_links.insert(link.trim().to_string());
            self.accepted_titles.push(title.to_string());
        }
        verdict
    }
}
