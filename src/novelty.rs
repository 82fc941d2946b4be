//! novelty.rs: cross-run novelty constraints for the drafting step.
//!
//! The engine does not detect topic overlap itself. It selects which historical
//! reports are handed over (the K newest, newest first), decides which baskets feed
//! which priority tier, and states each tier's repetition rule. The drafting
//! collaborator applies the rules against the passed-through history texts.

use anyhow::Result;
use std::fmt::Write as _;

use crate::basket::{Basket, BasketPriority};
use crate::config::BriefingConfig;
use crate::history::{HistoryStore, ReportRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// Highest-impact slots.
    One,
    /// Mid-weight structural issues.
    Two,
    /// Fresh discoveries only.
    Three,
}

impl Tier {
    pub fn number(self) -> u8 {
        match self {
            Tier::One => 1,
            Tier::Two => 2,
            Tier::Three => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repetition {
    /// Previously covered topics may return without penalty.
    Permitted,
    /// May return only when flagged as an update with materially new facts.
    Conditional,
    /// Anything overlapping the passed history is excluded.
    Forbidden,
}

/// Inclusive, 1-based slot range in the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRange {
    pub first: usize,
    pub last: usize,
}

impl SlotRange {
    pub fn len(&self) -> usize {
        (self.last + 1).saturating_sub(self.first)
    }

    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierRule {
    pub tier: Tier,
    pub slots: SlotRange,
    pub repetition: Repetition,
    /// Feeding baskets, in configuration order.
    pub baskets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoveltyDirective {
    pub tiers: Vec<TierRule>,
    /// Recall baskets; usable by every tier to fill gaps.
    pub supplementary: Vec<String>,
    /// Newest first, at most K.
    pub history: Vec<ReportRecord>,
}

impl NoveltyDirective {
    pub fn has_history(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn total_slots(&self) -> usize {
        self.tiers.last().map(|t| t.slots.last).unwrap_or(0)
    }

    pub fn history_texts(&self) -> Vec<&str> {
        self.history.iter().map(|r| r.content.as_str()).collect()
    }

    /// Plain-text rendering handed to the drafting collaborator.
    pub fn render_instructions(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Select {} issues in total, allocated by tier:",
            self.total_slots()
        );
        for rule in &self.tiers {
            let sources = if rule.baskets.is_empty() {
                "any basket".to_string()
            } else {
                rule.baskets.join(", ")
            };
            let _ = write!(
                out,
                "- Tier {} (slots {}-{}), drawn from: {}.",
                rule.tier.number(),
                rule.slots.first,
                rule.slots.last,
                sources
            );
            if self.has_history() {
                let clause = match rule.repetition {
                    Repetition::Permitted => {
                        " Topics from previous reports may repeat if they are still the most significant; bring the latest developments."
                    }
                    Repetition::Conditional => {
                        " A topic from previous reports may repeat only if marked [UPDATED] and backed by materially new facts."
                    }
                    Repetition::Forbidden => {
                        " Must be entirely new: exclude any topic whose terms appear in the previous reports below."
                    }
                };
                out.push_str(clause);
            }
            out.push('\n');
        }
        if !self.supplementary.is_empty() {
            let _ = writeln!(
                out,
                "Supplementary baskets (fill gaps in any tier): {}.",
                self.supplementary.join(", ")
            );
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct NoveltyConstraintEngine {
    tier_slots: [usize; 3],
    recent_limit: usize,
}

impl NoveltyConstraintEngine {
    pub fn new(tier_slots: [usize; 3], recent_limit: usize) -> Self {
        Self {
            tier_slots,
            recent_limit,
        }
    }

    pub fn from_config(cfg: &BriefingConfig) -> Self {
        Self::new(cfg.novelty.tier_slots, cfg.history.recent_limit)
    }

    pub fn recent_limit(&self) -> usize {
        self.recent_limit
    }

    /// Read the K newest records from the store and build the directive.
    pub fn build(&self, baskets: &[Basket], history: &HistoryStore) -> Result<NoveltyDirective> {
        let recent = history.get_recent(self.recent_limit)?;
        Ok(self.build_from(baskets, recent))
    }

    /// `recent` must already be newest first; anything past K is dropped.
    pub fn build_from(&self, baskets: &[Basket], mut recent: Vec<ReportRecord>) -> NoveltyDirective {
        recent.truncate(self.recent_limit);

        let names_with = |p: BasketPriority| -> Vec<String> {
            baskets
                .iter()
                .filter(|b| b.priority == p)
                .map(|b| b.name.clone())
                .collect()
        };
        let primary = names_with(BasketPriority::Primary);
        let secondary = names_with(BasketPriority::Secondary);

        let mut next_slot = 1;
        let mut tiers = Vec::with_capacity(3);
        let layout = [
            (Tier::One, Repetition::Permitted, primary),
            (Tier::Two, Repetition::Conditional, secondary.clone()),
            (Tier::Three, Repetition::Forbidden, secondary),
        ];
        for ((tier, repetition, feeding), count) in layout.into_iter().zip(self.tier_slots) {
            if count == 0 {
                continue;
            }
            let slots = SlotRange {
                first: next_slot,
                last: next_slot + count - 1,
            };
            next_slot += count;
            tiers.push(TierRule {
                tier,
                slots,
                repetition,
                baskets: feeding,
            });
        }

        NoveltyDirective {
            tiers,
            supplementary: names_with(BasketPriority::Recall),
            history: recent,
        }
    }
}

/// Baskets ordered by priority (Primary, Secondary, Recall), stable within one.
pub fn ordered_baskets(baskets: &[Basket]) -> Vec<&Basket> {
    let mut out: Vec<&Basket> = baskets.iter().collect();
    out.sort_by_key(|b| b.priority);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_slot_range_is_empty() {
        let r = SlotRange { first: 5, last: 2 };
        assert_eq!(r.len(), 0);
        assert!(r.is_empty());
        assert_eq!(SlotRange { first: 6, last: 10 }.len(), 5);
    }

    fn basket(name: &str, priority: BasketPriority) -> Basket {
        Basket {
            name: name.to_string(),
            priority,
            items: Vec::new(),
        }
    }

    #[test]
    fn zero_sized_tiers_are_skipped_and_slots_stay_contiguous() {
        let engine = NoveltyConstraintEngine::new([3, 0, 4], 3);
        let d = engine.build_from(&[basket("A", BasketPriority::Primary)], Vec::new());
        assert_eq!(d.tiers.len(), 2);
        assert_eq!(d.tiers[0].slots, SlotRange { first: 1, last: 3 });
        assert_eq!(d.tiers[1].tier, Tier::Three);
        assert_eq!(d.tiers[1].slots, SlotRange { first: 4, last: 7 });
        assert_eq!(d.total_slots(), 7);
    }

    #[test]
    fn instructions_omit_novelty_clauses_without_history() {
        let engine = NoveltyConstraintEngine::new([5, 5, 10], 3);
        let d = engine.build_from(&[basket("A", BasketPriority::Primary)], Vec::new());
        let text = d.render_instructions();
        assert!(text.contains("Tier 1 (slots 1-5), drawn from: A."));
        assert!(!text.contains("[UPDATED]"));
    }

    #[test]
    fn ordered_baskets_is_stable_by_priority() {
        let bs = vec![
            basket("recall", BasketPriority::Recall),
            basket("b", BasketPriority::Secondary),
            basket("a", BasketPriority::Primary),
            basket("d", BasketPriority::Secondary),
            basket("c", BasketPriority::Primary),
        ];
        let names: Vec<_> = ordered_baskets(&bs).iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "b", "d", "recall"]);
    }
}
