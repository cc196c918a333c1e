use super::Product;
use crate::utils::round2;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const REASON_COLLABORATIVE: &str = "users with similar taste liked this";
pub const REASON_POPULAR: &str = "popular product";
pub const REASON_HYBRID: &str = "recommended based on similar users and your interests";

pub fn content_reason(category: &str) -> String {
    format!("based on your interest in {}", category)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    Popularity,
    Collaborative,
    ContentBased,
    Hybrid,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Popularity => "popularity",
            Algorithm::Collaborative => "collaborative",
            Algorithm::ContentBased => "content-based",
            Algorithm::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedProduct {
    pub product: Product,
    pub score: f64,
    pub reason: String,
}

/// Ranked recommendation result. Rank is list position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Absent for product-to-product results
    pub user_id: Option<Uuid>,
    pub products: Vec<RecommendedProduct>,
    pub algorithm: Algorithm,
    pub score: f64,
}

impl Recommendation {
    pub fn new(user_id: Option<Uuid>, products: Vec<RecommendedProduct>, algorithm: Algorithm) -> Self {
        let mut rec = Self {
            user_id,
            products,
            algorithm,
            score: 0.0,
        };
        rec.refresh_score();
        rec
    }

    pub fn empty(user_id: Option<Uuid>, algorithm: Algorithm) -> Self {
        Self::new(user_id, Vec::new(), algorithm)
    }

    /// Recompute the aggregate score from the current items
    pub fn refresh_score(&mut self) {
        self.score = aggregate_score(&self.products);
    }
}

/// Mean of item scores rounded to 2 decimals; 0 for no items.
pub fn aggregate_score(products: &[RecommendedProduct]) -> f64 {
    if products.is_empty() {
        return 0.0;
    }
    let sum: f64 = products.iter().map(|p| p.score).sum();
    round2(sum / products.len() as f64)
}
