//! Typed recommendation cache on top of a raw `CacheStore`.
//!
//! Reads and popularity bookkeeping are best-effort: failures are logged and
//! reported as a miss. Only explicit invalidation surfaces errors.

use crate::error::Result;
use crate::models::{Product, Recommendation};
use rec_cache::{CacheKey, CacheStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct RecommendationCache {
    store: Arc<dyn CacheStore>,
    ttl_secs: u64,
}

impl RecommendationCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl_secs: u64) -> Self {
        Self { store, ttl_secs }
    }

    pub async fn get_user(&self, user_id: Uuid) -> Option<Recommendation> {
        self.get_json(&CacheKey::user_recommendations(user_id)).await
    }

    pub async fn put_user(&self, user_id: Uuid, rec: &Recommendation) {
        self.put_json(&CacheKey::user_recommendations(user_id), rec)
            .await
    }

    pub async fn get_related(&self, product_id: Uuid) -> Option<Vec<Product>> {
        self.get_json(&CacheKey::product_recommendations(product_id))
            .await
    }

    pub async fn put_related(&self, product_id: Uuid, products: &[Product]) {
        self.put_json(&CacheKey::product_recommendations(product_id), &products)
            .await
    }

    pub async fn get_bought_together(&self, product_id: Uuid) -> Option<Vec<Product>> {
        self.get_json(&CacheKey::frequently_bought_together(product_id))
            .await
    }

    pub async fn put_bought_together(&self, product_id: Uuid, products: &[Product]) {
        self.put_json(&CacheKey::frequently_bought_together(product_id), &products)
            .await
    }

    /// Drop the cached personalized recommendation of a user
    pub async fn invalidate_user(&self, user_id: Uuid) -> Result<()> {
        let key = CacheKey::user_recommendations(user_id);
        self.store.del(&key).await?;
        debug!(user_id = %user_id, "Invalidated user recommendations");
        Ok(())
    }

    /// Bump the view counter of a product
    pub async fn record_view(&self, product_id: Uuid) {
        let key = CacheKey::product_views(product_id);
        if let Err(e) = self.store.incr(&key).await {
            warn!(key = %key, error = %e, "Failed to bump view counter");
        }
    }

    /// Add an interaction weight to the global popularity ranking
    pub async fn record_popularity(&self, product_id: Uuid, weight: f64) {
        let key = CacheKey::popular_products();
        if let Err(e) = self
            .store
            .zincr_by(&key, &product_id.to_string(), weight)
            .await
        {
            warn!(key = %key, product_id = %product_id, error = %e, "Failed to update popularity");
        }
    }

    /// Most popular product ids from the live ranking; `None` when the cache
    /// is unreachable.
    pub async fn top_popular(&self, n: usize) -> Option<Vec<Uuid>> {
        let key = CacheKey::popular_products();
        match self.store.ztop(&key, n).await {
            Ok(members) => Some(
                members
                    .iter()
                    .filter_map(|m| Uuid::parse_str(m).ok())
                    .collect(),
            ),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read popularity ranking");
                None
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %key, error = %e, "Malformed cache entry, treating as miss");
                None
            }
        }
    }

    async fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize cache entry");
                return;
            }
        };

        if let Err(e) = self.store.set(key, &raw, self.ttl_secs).await {
            warn!(key = %key, error = %e, "Cache write failed");
        }
    }
}
