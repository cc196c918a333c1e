use crate::error::Result;
use crate::models::{
    Interaction, InteractionType, Product, ProductRelation, Purchase, UserSimilarity,
};
use std::collections::HashMap;
use uuid::Uuid;

/// Read access to the product catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ProductRepository: Send + Sync {
    /// Fetch one product. Missing products yield `AppError::NotFound`.
    async fn get_by_id(&self, id: Uuid) -> Result<Product>;

    /// Products in a category, best rated first
    async fn get_by_category(&self, category: &str, limit: usize) -> Result<Vec<Product>>;

    /// Globally popular products, sorted by rating desc then review count desc
    async fn get_popular(&self, limit: usize) -> Result<Vec<Product>>;

    /// Free-text search over name, description and tags, optionally within a category
    async fn search(
        &self,
        text: &str,
        category: Option<String>,
        limit: usize,
    ) -> Result<Vec<Product>>;
}

/// Append-only interaction log plus purchase receipts.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait InteractionRepository: Send + Sync {
    async fn create(&self, interaction: &Interaction) -> Result<()>;

    /// Most recent interactions of a user, newest first
    async fn get_user_interactions(&self, user_id: Uuid, limit: usize) -> Result<Vec<Interaction>>;

    /// Most recent interactions on a product, newest first
    async fn get_product_interactions(
        &self,
        product_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Interaction>>;

    /// Number of interactions on a product, per type
    async fn get_interaction_counts(&self, product_id: Uuid)
        -> Result<HashMap<InteractionType, i64>>;

    async fn create_purchase(&self, purchase: &Purchase) -> Result<()>;

    /// Purchases of a user, newest first
    async fn get_user_purchase_history(&self, user_id: Uuid) -> Result<Vec<Purchase>>;
}

/// User/product interaction graph.
///
/// Edges are keyed by (user, product, type). Upserts accumulate: weight is
/// added and count incremented, so an edge never loses signal.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GraphRepository: Send + Sync {
    async fn create_user_product_relation(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        interaction_type: &InteractionType,
        weight: f64,
    ) -> Result<()>;

    async fn get_user_product_relations(&self, user_id: Uuid) -> Result<Vec<ProductRelation>>;

    /// Users sharing products with `user_id`, most similar first
    async fn find_similar_users(&self, user_id: Uuid, limit: usize) -> Result<Vec<UserSimilarity>>;

    /// Products liked by similar users, ranked, excluding anything `user_id`
    /// has already interacted with
    async fn get_collaborative_recommendations(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Uuid>>;

    /// Products co-interacted with `product_id`, ranked
    async fn get_similar_products(&self, product_id: Uuid, limit: usize) -> Result<Vec<Uuid>>;

    /// Products co-purchased with `product_id`, ranked
    async fn get_frequently_bought_together(
        &self,
        product_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Uuid>>;

    /// Jaccard similarity of the two users' product sets
    async fn calculate_user_similarity(&self, user_a: Uuid, user_b: Uuid) -> Result<f64>;

    /// Sum of incoming edge weights on a product
    async fn get_product_popularity_score(&self, product_id: Uuid) -> Result<f64>;
}
