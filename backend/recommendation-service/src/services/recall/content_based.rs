use super::RecommendationStrategy;
use crate::error::Result;
use crate::models::{content_reason, Algorithm, RecommendedProduct};
use crate::repository::ProductRepository;
use crate::services::profile_builder::ContentProfileBuilder;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Category-affinity recommendations from the user's own history
pub struct ContentBasedRecommender {
    profiles: ContentProfileBuilder,
    products: Arc<dyn ProductRepository>,
    pool_size: usize,
    normalizer: f64,
}

impl ContentBasedRecommender {
    pub fn new(
        profiles: ContentProfileBuilder,
        products: Arc<dyn ProductRepository>,
        pool_size: usize,
        normalizer: f64,
    ) -> Self {
        Self {
            profiles,
            products,
            pool_size,
            normalizer,
        }
    }
}

#[async_trait]
impl RecommendationStrategy for ContentBasedRecommender {
    async fn recommend(&self, user_id: Uuid, limit: usize) -> Result<Vec<RecommendedProduct>> {
        let profile = self.profiles.build(user_id).await?;
        let mut picked = Vec::new();
        let mut seen: HashSet<Uuid> = HashSet::new();

        for category in &profile.categories {
            if picked.len() >= limit {
                break;
            }

            let pool = match self
                .products
                .get_by_category(&category.category, self.pool_size)
                .await
            {
                Ok(pool) => pool,
                Err(e) => {
                    warn!(
                        user_id = %user_id,
                        category = %category.category,
                        error = %e,
                        "Category lookup failed, skipping"
                    );
                    continue;
                }
            };

            let score = (category.score / self.normalizer).min(1.0);
            // Whole pool is taken before the limit check
            for product in pool {
                if profile.interacted.contains(&product.id) || !seen.insert(product.id) {
                    continue;
                }
                picked.push(RecommendedProduct {
                    product,
                    score,
                    reason: content_reason(&category.category),
                });
            }
        }

        picked.truncate(limit);
        debug!(user_id = %user_id, count = picked.len(), "Content-based candidates");
        Ok(picked)
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::ContentBased
    }
}
