use super::RecommendationStrategy;
use crate::error::Result;
use crate::models::{Algorithm, RecommendedProduct, REASON_POPULAR};
use crate::repository::ProductRepository;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Highest possible product rating
const MAX_RATING: f64 = 5.0;

/// Cold-start fallback: global best-rated products, no personalization
pub struct PopularityRecommender {
    products: Arc<dyn ProductRepository>,
}

impl PopularityRecommender {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl RecommendationStrategy for PopularityRecommender {
    async fn recommend(&self, _user_id: Uuid, limit: usize) -> Result<Vec<RecommendedProduct>> {
        let popular = self.products.get_popular(limit).await?;
        Ok(popular
            .into_iter()
            .map(|product| RecommendedProduct {
                score: product.rating / MAX_RATING,
                product,
                reason: REASON_POPULAR.to_string(),
            })
            .collect())
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::Popularity
    }
}
