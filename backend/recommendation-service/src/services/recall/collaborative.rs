use super::{hydrate, RecommendationStrategy};
use crate::error::Result;
use crate::models::{Algorithm, RecommendedProduct, REASON_COLLABORATIVE};
use crate::repository::{GraphRepository, ProductRepository};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// "Users like you also liked" via the interaction graph.
///
/// Raw graph similarities are not comparable across users, so scores come
/// from rank position alone: `1 - i/N` over the graph's result list.
pub struct CollaborativeRecommender {
    graph: Arc<dyn GraphRepository>,
    products: Arc<dyn ProductRepository>,
}

impl CollaborativeRecommender {
    pub fn new(graph: Arc<dyn GraphRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self { graph, products }
    }
}

#[async_trait]
impl RecommendationStrategy for CollaborativeRecommender {
    async fn recommend(&self, user_id: Uuid, limit: usize) -> Result<Vec<RecommendedProduct>> {
        let ids = self
            .graph
            .get_collaborative_recommendations(user_id, limit)
            .await?;
        let total = ids.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let resolved = hydrate(&self.products, ids).await?;
        debug!(
            user_id = %user_id,
            ranked = total,
            resolved = resolved.len(),
            "Collaborative candidates"
        );

        Ok(resolved
            .into_iter()
            .map(|(position, product)| RecommendedProduct {
                product,
                score: 1.0 - position as f64 / total as f64,
                reason: REASON_COLLABORATIVE.to_string(),
            })
            .collect())
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::Collaborative
    }
}
