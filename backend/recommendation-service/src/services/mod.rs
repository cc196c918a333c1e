pub mod cache;
pub mod interaction;
pub mod merge;
pub mod profile_builder;
pub mod recall;
pub mod recommendation;

pub use cache::RecommendationCache;
pub use interaction::InteractionService;
pub use merge::{HybridWeights, ScoreMerger};
pub use profile_builder::{CategoryScore, ContentProfile, ContentProfileBuilder};
pub use recall::{
    CollaborativeRecommender, ContentBasedRecommender, PopularityRecommender,
    RecommendationStrategy,
};
pub use recommendation::RecommendationService;
