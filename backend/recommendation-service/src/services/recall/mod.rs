mod collaborative;
mod content_based;
mod popularity;

use crate::error::Result;
use crate::models::{Algorithm, Product, RecommendedProduct};
use crate::repository::ProductRepository;
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub use collaborative::CollaborativeRecommender;
pub use content_based::ContentBasedRecommender;
pub use popularity::PopularityRecommender;

/// Catalog lookups in flight while hydrating ranked ids
const HYDRATE_CONCURRENCY: usize = 8;

/// A single recommendation strategy
#[async_trait]
pub trait RecommendationStrategy: Send + Sync {
    /// Up to `limit` scored products, best first
    async fn recommend(&self, user_id: Uuid, limit: usize) -> Result<Vec<RecommendedProduct>>;
    fn algorithm(&self) -> Algorithm;
}

/// Resolve ranked ids against the catalog, keeping input order.
///
/// Each entry keeps its original position so callers can score on the raw
/// ranking. Missing products are dropped; other catalog errors propagate.
pub(crate) async fn hydrate(
    products: &Arc<dyn ProductRepository>,
    ids: Vec<Uuid>,
) -> Result<Vec<(usize, Product)>> {
    let resolved: Vec<Option<(usize, Product)>> = stream::iter(ids.into_iter().enumerate())
        .map(|(position, id)| {
            let products = Arc::clone(products);
            async move {
                match products.get_by_id(id).await {
                    Ok(product) => Ok(Some((position, product))),
                    Err(e) if e.is_not_found() => {
                        debug!(product_id = %id, "Skipping unresolved product");
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            }
        })
        .buffered(HYDRATE_CONCURRENCY)
        .try_collect()
        .await?;

    Ok(resolved.into_iter().flatten().collect())
}
