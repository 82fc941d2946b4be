//! basket.rs: topical baskets backed by fixed keyword sets.

use serde::{Deserialize, Serialize};

use crate::ingest::types::NewsItem;

/// How strongly a basket feeds the report's priority tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasketPriority {
    /// Feeds tier 1 (top slots).
    Primary,
    /// Feeds tiers 2 and 3.
    #[default]
    Secondary,
    /// Supplementary material for every tier.
    Recall,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketSpec {
    pub name: String,
    #[serde(default)]
    pub priority: BasketPriority,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl BasketSpec {
    pub fn new<S: Into<String>>(name: S, priority: BasketPriority, keywords: &[&str]) -> Self {
        Self {
            name: name.into(),
            priority,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Basket {
    pub name: String,
    pub priority: BasketPriority,
    /// In the order items survived filtering.
    pub items: Vec<NewsItem>,
}

impl Basket {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Collects filtered items into one basket per spec. Every spec yields a basket,
/// including those that end up empty.
#[derive(Debug, Clone)]
pub struct BasketAssembler {
    baskets: Vec<Basket>,
}

impl BasketAssembler {
    pub fn new(specs: &[BasketSpec]) -> Self {
        let baskets = specs
            .iter()
            .map(|s| Basket {
                name: s.name.clone(),
                priority: s.priority,
                items: Vec::new(),
            })
            .collect();
        Self { baskets }
    }

    /// Attribute an item to the basket whose keyword produced it.
    pub fn push(&mut self, basket_index: usize, item: NewsItem) {
        if let Some(b) = self.baskets.get_mut(basket_index) {
            b.items.push(item);
        } else {
            tracing::warn!(target: "ingest", basket_index, "item for unknown basket ignored");
        }
    }

    pub fn total_items(&self) -> usize {
        self.baskets.iter().map(Basket::len).sum()
    }

    pub fn finish(self) -> Vec<Basket> {
        self.baskets
    }
}

/// Total item count across baskets.
pub fn total_items(baskets: &[Basket]) -> usize {
    baskets.iter().map(Basket::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(link: &str) -> NewsItem {
        NewsItem {
            title: format!("title {link}"),
            description: String::new(),
            link: link.to_string(),
            published_at: None,
        }
    }

    #[test]
    fn empty_baskets_are_kept_in_config_order() {
        let specs = vec![
            BasketSpec::new("A", BasketPriority::Primary, &["x"]),
            BasketSpec::new("B", BasketPriority::Secondary, &["y"]),
        ];
        let mut asm = BasketAssembler::new(&specs);
        asm.push(0, item("1"));
        let out = asm.finish();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "A");
        assert_eq!(out[0].len(), 1);
        assert_eq!(out[1].name, "B");
        assert!(out[1].is_empty());
    }

    #[test]
    fn insertion_order_is_preserved() {
        let specs = vec![BasketSpec::new("A", BasketPriority::Primary, &["x"])];
        let mut asm = BasketAssembler::new(&specs);
        for l in ["3", "1", "2"] {
            asm.push(0, item(l));
        }
        let links: Vec<_> = asm.finish()[0].items.iter().map(|i| i.link.clone()).collect();
        assert_eq!(links, vec!["3", "1", "2"]);
    }

    #[test]
    fn out_of_range_index_is_ignored() {
        let mut asm = BasketAssembler::new(&[]);
        asm.push(3, item("x"));
        assert_eq!(asm.total_items(), 0);
    }
}
