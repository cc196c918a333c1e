mod interaction;
mod product;
mod recommendation;

pub use interaction::{
    Interaction, InteractionType, ProductRelation, Purchase, PurchaseItem, UserSimilarity,
};
pub use product::Product;
pub use recommendation::{
    aggregate_score, content_reason, Algorithm, Recommendation, RecommendedProduct,
    REASON_COLLABORATIVE, REASON_HYBRID, REASON_POPULAR,
};
