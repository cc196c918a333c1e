use crate::models::{RecommendedProduct, REASON_HYBRID};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Blend coefficients for the hybrid merge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridWeights {
    pub collaborative: f64,
    pub content: f64,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            collaborative: 0.6,
            content: 0.4,
        }
    }
}

/// Weighted union of collaborative and content-based results.
///
/// Scores are scaled per source and summed on overlap; a product repeated
/// within one source keeps its first entry. The final order is a
/// stable sort by score, so equal scores keep insertion order: collaborative
/// items first, then content-only items.
#[derive(Debug, Clone, Default)]
pub struct ScoreMerger {
    weights: HybridWeights,
}

impl ScoreMerger {
    pub fn new(weights: HybridWeights) -> Self {
        Self { weights }
    }

    pub fn merge(
        &self,
        collaborative: Vec<RecommendedProduct>,
        content: Vec<RecommendedProduct>,
        limit: usize,
    ) -> Vec<RecommendedProduct> {
        let mut merged: Vec<RecommendedProduct> =
            Vec::with_capacity(collaborative.len() + content.len());
        // product id -> (slot in `merged`, source that inserted it)
        let mut index: HashMap<Uuid, (usize, usize)> = HashMap::new();

        let sources = [
            (collaborative, self.weights.collaborative),
            (content, self.weights.content),
        ];
        for (source, (items, weight)) in sources.into_iter().enumerate() {
            let mut seen: HashSet<Uuid> = HashSet::with_capacity(items.len());
            for mut item in items {
                // A source counts once per product; its first entry wins
                if !seen.insert(item.product.id) {
                    continue;
                }
                let scaled = item.score * weight;
                match index.get(&item.product.id).copied() {
                    Some((slot, owner)) if owner != source => {
                        let existing = &mut merged[slot];
                        existing.score += scaled;
                        existing.reason = REASON_HYBRID.to_string();
                    }
                    Some(_) => {}
                    None => {
                        item.score = scaled;
                        index.insert(item.product.id, (merged.len(), source));
                        merged.push(item);
                    }
                }
            }
        }

        merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        merged.truncate(limit);
        merged
    }
}
