//! Read path: strategy selection, hybrid merge and result caching.

use super::cache::RecommendationCache;
use super::interaction::InteractionService;
use super::merge::{HybridWeights, ScoreMerger};
use super::profile_builder::ContentProfileBuilder;
use super::recall::{
    hydrate, CollaborativeRecommender, ContentBasedRecommender, PopularityRecommender,
    RecommendationStrategy,
};
use crate::config::RecommendationConfig;
use crate::error::Result;
use crate::models::{
    Algorithm, Interaction, InteractionType, Product, ProductRelation, Purchase, PurchaseItem,
    Recommendation, UserSimilarity,
};
use crate::repository::{GraphRepository, InteractionRepository, ProductRepository};
use crate::utils::clamp_limit;
use rec_cache::CacheStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Recommendation engine facade.
///
/// Holds no mutable state of its own; every call reads the collaborators
/// afresh, so one instance can serve any number of concurrent requests.
/// Dropping a returned future cancels every collaborator call it started.
#[derive(Clone)]
pub struct RecommendationService {
    products: Arc<dyn ProductRepository>,
    interactions: Arc<dyn InteractionRepository>,
    graph: Arc<dyn GraphRepository>,
    cache: RecommendationCache,
    recorder: InteractionService,
    collaborative: Arc<dyn RecommendationStrategy>,
    content: Arc<dyn RecommendationStrategy>,
    popularity: Arc<dyn RecommendationStrategy>,
    merger: ScoreMerger,
    config: RecommendationConfig,
}

impl RecommendationService {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        interactions: Arc<dyn InteractionRepository>,
        graph: Arc<dyn GraphRepository>,
        store: Arc<dyn CacheStore>,
        config: RecommendationConfig,
    ) -> Self {
        let cache = RecommendationCache::new(store, config.cache_ttl_secs);
        let recorder =
            InteractionService::new(interactions.clone(), graph.clone(), cache.clone());
        let profiles = ContentProfileBuilder::new(
            interactions.clone(),
            products.clone(),
            config.profile_window,
            config.top_categories,
        );
        let merger = ScoreMerger::new(HybridWeights {
            collaborative: config.collaborative_weight,
            content: config.content_weight,
        });

        Self {
            collaborative: Arc::new(CollaborativeRecommender::new(
                graph.clone(),
                products.clone(),
            )),
            content: Arc::new(ContentBasedRecommender::new(
                profiles,
                products.clone(),
                config.category_pool_size,
                config.category_score_normalizer,
            )),
            popularity: Arc::new(PopularityRecommender::new(products.clone())),
            products,
            interactions,
            graph,
            cache,
            recorder,
            merger,
            config,
        }
    }

    pub fn config(&self) -> &RecommendationConfig {
        &self.config
    }

    // ---- write path ----

    pub async fn record_interaction(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        interaction_type: InteractionType,
    ) -> Result<()> {
        self.recorder
            .record_interaction(user_id, product_id, interaction_type)
            .await
    }

    pub async fn record_purchase(
        &self,
        user_id: Uuid,
        items: Vec<PurchaseItem>,
        status: &str,
    ) -> Result<Purchase> {
        self.recorder.record_purchase(user_id, items, status).await
    }

    pub async fn create_purchase(&self, purchase: &Purchase) -> Result<()> {
        self.recorder.create_purchase(purchase).await
    }

    pub async fn get_user_purchase_history(&self, user_id: Uuid) -> Result<Vec<Purchase>> {
        self.recorder.get_user_purchase_history(user_id).await
    }

    pub async fn get_product_interaction_counts(
        &self,
        product_id: Uuid,
    ) -> Result<HashMap<InteractionType, i64>> {
        self.recorder.get_product_interaction_counts(product_id).await
    }

    pub async fn invalidate_user_cache(&self, user_id: Uuid) -> Result<()> {
        self.cache.invalidate_user(user_id).await
    }

    // ---- read path ----

    /// Cached personalized recommendations: popularity for users with too
    /// little history, hybrid otherwise.
    ///
    /// `limit == 0` returns an empty `Hybrid` recommendation without reading
    /// the log, so the tag is the personalized kind rather than the branch
    /// the user's history would have selected.
    pub async fn get_personalized_recommendations(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Recommendation> {
        if limit == 0 {
            return Ok(Recommendation::empty(Some(user_id), Algorithm::Hybrid));
        }
        let limit = clamp_limit(limit);

        if let Some(mut cached) = self.cache.get_user(user_id).await {
            debug!(user_id = %user_id, "Serving cached recommendations");
            cached.refresh_score();
            return Ok(cached);
        }

        let history = self
            .interactions
            .get_user_interactions(user_id, self.config.history_window)
            .await?;

        let rec = if history.len() < self.config.min_interactions {
            debug!(
                user_id = %user_id,
                interactions = history.len(),
                threshold = self.config.min_interactions,
                "Cold start, using popularity"
            );
            let items = self.popularity.recommend(user_id, limit).await?;
            Recommendation::new(Some(user_id), items, Algorithm::Popularity)
        } else {
            self.hybrid(user_id, limit).await
        };

        self.cache.put_user(user_id, &rec).await;

        info!(
            user_id = %user_id,
            algorithm = %rec.algorithm,
            count = rec.products.len(),
            score = rec.score,
            "Computed personalized recommendations"
        );
        Ok(rec)
    }

    /// Hybrid merge computed directly: no cache and no eligibility check.
    pub async fn get_hybrid_recommendations(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Recommendation> {
        if limit == 0 {
            return Ok(Recommendation::empty(Some(user_id), Algorithm::Hybrid));
        }
        Ok(self.hybrid(user_id, clamp_limit(limit)).await)
    }

    pub async fn get_collaborative_recommendations(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Recommendation> {
        self.single_strategy(self.collaborative.as_ref(), user_id, limit)
            .await
    }

    pub async fn get_content_based_recommendations(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Recommendation> {
        self.single_strategy(self.content.as_ref(), user_id, limit)
            .await
    }

    /// "Customers who viewed this also viewed"
    pub async fn get_product_recommendations(
        &self,
        product_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Product>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = clamp_limit(limit);

        if let Some(cached) = self.cache.get_related(product_id).await {
            return Ok(cached);
        }

        let ids = self.graph.get_similar_products(product_id, limit).await?;
        let products: Vec<Product> = hydrate(&self.products, ids)
            .await?
            .into_iter()
            .map(|(_, product)| product)
            .collect();

        self.cache.put_related(product_id, &products).await;
        Ok(products)
    }

    /// Products commonly purchased alongside `product_id`
    pub async fn get_frequently_bought_together(
        &self,
        product_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Product>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = clamp_limit(limit);

        if let Some(cached) = self.cache.get_bought_together(product_id).await {
            return Ok(cached);
        }

        let ids = self
            .graph
            .get_frequently_bought_together(product_id, limit)
            .await?;
        let products: Vec<Product> = hydrate(&self.products, ids)
            .await?
            .into_iter()
            .map(|(_, product)| product)
            .collect();

        self.cache.put_bought_together(product_id, &products).await;
        Ok(products)
    }

    pub async fn find_similar_users(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<UserSimilarity>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.graph
            .find_similar_users(user_id, clamp_limit(limit))
            .await
    }

    /// Edges recorded for a user, one per product and interaction type
    pub async fn get_user_product_relations(&self, user_id: Uuid) -> Result<Vec<ProductRelation>> {
        self.graph.get_user_product_relations(user_id).await
    }

    /// Jaccard similarity of two users' product sets, 0.0 to 1.0
    pub async fn calculate_user_similarity(&self, user_a: Uuid, user_b: Uuid) -> Result<f64> {
        self.graph.calculate_user_similarity(user_a, user_b).await
    }

    /// Accumulated edge weight on a product across all users
    pub async fn get_product_popularity_score(&self, product_id: Uuid) -> Result<f64> {
        self.graph.get_product_popularity_score(product_id).await
    }

    /// Most recent interactions on a product, newest first
    pub async fn get_product_interactions(
        &self,
        product_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Interaction>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.interactions
            .get_product_interactions(product_id, clamp_limit(limit))
            .await
    }

    /// Live popularity ranking, falling back to best-rated products when the
    /// ranking is empty or unreachable.
    pub async fn get_trending_products(&self, limit: usize) -> Result<Vec<Product>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = clamp_limit(limit);

        if let Some(ids) = self.cache.top_popular(limit).await {
            if !ids.is_empty() {
                let products: Vec<Product> = hydrate(&self.products, ids)
                    .await?
                    .into_iter()
                    .map(|(_, product)| product)
                    .collect();
                if !products.is_empty() {
                    return Ok(products);
                }
            }
        }

        debug!("Popularity ranking empty, falling back to catalog");
        self.products.get_popular(limit).await
    }

    pub async fn search_products(
        &self,
        text: &str,
        category: Option<String>,
        limit: usize,
    ) -> Result<Vec<Product>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.products
            .search(text, category, clamp_limit(limit))
            .await
    }

    async fn single_strategy(
        &self,
        strategy: &dyn RecommendationStrategy,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Recommendation> {
        if limit == 0 {
            return Ok(Recommendation::empty(Some(user_id), strategy.algorithm()));
        }
        let items = strategy.recommend(user_id, clamp_limit(limit)).await?;
        Ok(Recommendation::new(Some(user_id), items, strategy.algorithm()))
    }

    /// Run both strategies concurrently; a failing strategy contributes
    /// nothing instead of failing the request.
    async fn hybrid(&self, user_id: Uuid, limit: usize) -> Recommendation {
        let (collaborative, content) = tokio::join!(
            self.collaborative.recommend(user_id, limit),
            self.content.recommend(user_id, limit),
        );

        let collaborative = collaborative.unwrap_or_else(|e| {
            warn!(user_id = %user_id, error = %e, "Collaborative strategy failed");
            Vec::new()
        });
        let content = content.unwrap_or_else(|e| {
            warn!(user_id = %user_id, error = %e, "Content-based strategy failed");
            Vec::new()
        });

        let merged = self.merger.merge(collaborative, content, limit);
        Recommendation::new(Some(user_id), merged, Algorithm::Hybrid)
    }
}
