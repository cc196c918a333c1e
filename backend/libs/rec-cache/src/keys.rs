//! Recommendation cache key schema
//!
//! Every service touching the recommendation cache must build keys here so
//! that the write path invalidates exactly what the read path stores.

use uuid::Uuid;

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    // ============= Recommendation Keys =============

    /// Personalized recommendation for a user
    /// Format: rec:user:{user_id}
    pub fn user_recommendations(user_id: Uuid) -> String {
        format!("rec:user:{}", user_id)
    }

    /// Related products ("customers who viewed this also viewed")
    /// Format: rec:product:{product_id}
    pub fn product_recommendations(product_id: Uuid) -> String {
        format!("rec:product:{}", product_id)
    }

    /// Products frequently purchased with the given product
    /// Format: rec:fbt:{product_id}
    pub fn frequently_bought_together(product_id: Uuid) -> String {
        format!("rec:fbt:{}", product_id)
    }

    // ============= Popularity Keys =============

    /// Sorted set of product ids scored by accumulated interaction weight
    pub fn popular_products() -> String {
        "popular:products".to_string()
    }

    /// View counter for a product
    /// Format: views:product:{product_id}
    pub fn product_views(product_id: Uuid) -> String {
        format!("views:product:{}", product_id)
    }

    // ============= Utility =============

    /// Entity label used for metrics.
    ///
    /// `rec:{entity}:...` keys report the segment after the namespace, other
    /// keys report their first segment.
    pub fn entity_type(key: &str) -> Option<&str> {
        let mut parts = key.split(':');
        match parts.next() {
            Some("rec") => parts.next().filter(|s| !s.is_empty()),
            Some(first) if !first.is_empty() && key.contains(':') => Some(first),
            _ => None,
        }
    }
}
