//! Content profile: a user's top interest categories derived from recent
//! interactions, weighted by interaction type.

use crate::error::Result;
use crate::repository::{InteractionRepository, ProductRepository};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Concurrent catalog lookups while resolving history products
const RESOLVE_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryScore {
    pub category: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ContentProfile {
    /// Highest accumulated score first
    pub categories: Vec<CategoryScore>,
    /// Every product in the window, resolvable or not
    pub interacted: HashSet<Uuid>,
}

#[derive(Clone)]
pub struct ContentProfileBuilder {
    interactions: Arc<dyn InteractionRepository>,
    products: Arc<dyn ProductRepository>,
    window: usize,
    top_k: usize,
}

impl ContentProfileBuilder {
    pub fn new(
        interactions: Arc<dyn InteractionRepository>,
        products: Arc<dyn ProductRepository>,
        window: usize,
        top_k: usize,
    ) -> Self {
        Self {
            interactions,
            products,
            window,
            top_k,
        }
    }

    pub async fn build(&self, user_id: Uuid) -> Result<ContentProfile> {
        let history = self
            .interactions
            .get_user_interactions(user_id, self.window)
            .await?;

        let interacted: HashSet<Uuid> = history.iter().map(|i| i.product_id).collect();

        let mut unique = Vec::with_capacity(interacted.len());
        let mut seen = HashSet::with_capacity(interacted.len());
        for interaction in &history {
            if seen.insert(interaction.product_id) {
                unique.push(interaction.product_id);
            }
        }

        // Deleted products drop out of the profile; other failures abort
        let resolved: Vec<Option<(Uuid, String)>> = stream::iter(unique)
            .map(|product_id| {
                let products = Arc::clone(&self.products);
                async move {
                    match products.get_by_id(product_id).await {
                        Ok(product) => Ok(Some((product_id, product.category))),
                        Err(e) if e.is_not_found() => Ok(None),
                        Err(e) => Err(e),
                    }
                }
            })
            .buffered(RESOLVE_CONCURRENCY)
            .try_collect()
            .await?;
        let categories_by_product: HashMap<Uuid, String> = resolved.into_iter().flatten().collect();

        let mut scores: HashMap<String, f64> = HashMap::new();
        for interaction in &history {
            if let Some(category) = categories_by_product.get(&interaction.product_id) {
                *scores.entry(category.clone()).or_insert(0.0) += interaction.weight;
            }
        }

        let categories = rank_categories(scores, self.top_k);
        debug!(
            user_id = %user_id,
            history = history.len(),
            categories = categories.len(),
            "Built content profile"
        );

        Ok(ContentProfile {
            categories,
            interacted,
        })
    }
}

/// Sort by score descending, then name ascending, and keep the first `top_k`.
pub fn rank_categories(scores: HashMap<String, f64>, top_k: usize) -> Vec<CategoryScore> {
    let mut ranked: Vec<CategoryScore> = scores
        .into_iter()
        .map(|(category, score)| CategoryScore { category, score })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
    ranked.truncate(top_k);
    ranked
}
