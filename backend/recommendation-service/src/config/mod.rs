use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub neo4j: Neo4jConfig,
    pub recommendation: RecommendationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(rename = "database_url")]
    pub url: String,
    #[serde(rename = "database_max_connections", default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(rename = "redis_url", default = "default_redis_url")]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jConfig {
    /// Neo4j bolt URI, e.g. bolt://neo4j:7687
    #[serde(rename = "neo4j_uri", default = "default_neo4j_uri")]
    pub uri: String,
    #[serde(rename = "neo4j_user", default = "default_neo4j_user")]
    pub user: String,
    #[serde(rename = "neo4j_password", default)]
    pub password: String,
}

/// Tuning knobs for the recommendation engine.
///
/// Passed explicitly to `RecommendationService::new`; nothing in the engine
/// reads process environment on its own.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationConfig {
    /// TTL of cached recommendations, seconds
    #[serde(rename = "recommendation_cache_ttl", default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// Users with fewer interactions than this get popularity results
    #[serde(
        rename = "min_interactions_for_recommendation",
        default = "default_min_interactions"
    )]
    pub min_interactions: usize,
    /// Interactions fetched for the eligibility check
    #[serde(rename = "recommendation_history_window", default = "default_history_window")]
    pub history_window: usize,
    /// Interactions fed to the content profile
    #[serde(rename = "recommendation_profile_window", default = "default_profile_window")]
    pub profile_window: usize,
    #[serde(rename = "recommendation_top_categories", default = "default_top_categories")]
    pub top_categories: usize,
    /// Candidates fetched per category
    #[serde(rename = "recommendation_category_pool", default = "default_category_pool")]
    pub category_pool_size: usize,
    #[serde(
        rename = "recommendation_category_normalizer",
        default = "default_category_normalizer"
    )]
    pub category_score_normalizer: f64,
    #[serde(
        rename = "recommendation_collaborative_weight",
        default = "default_collaborative_weight"
    )]
    pub collaborative_weight: f64,
    #[serde(rename = "recommendation_content_weight", default = "default_content_weight")]
    pub content_weight: f64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl(),
            min_interactions: default_min_interactions(),
            history_window: default_history_window(),
            profile_window: default_profile_window(),
            top_categories: default_top_categories(),
            category_pool_size: default_category_pool(),
            category_score_normalizer: default_category_normalizer(),
            collaborative_weight: default_collaborative_weight(),
            content_weight: default_content_weight(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_neo4j_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_neo4j_user() -> String {
    "neo4j".to_string()
}

fn default_cache_ttl() -> u64 {
    rec_cache::ttl::RECOMMENDATION
}

fn default_min_interactions() -> usize {
    5
}

fn default_history_window() -> usize {
    100
}

fn default_profile_window() -> usize {
    50
}

fn default_top_categories() -> usize {
    3
}

fn default_category_pool() -> usize {
    20
}

fn default_category_normalizer() -> f64 {
    100.0
}

fn default_collaborative_weight() -> f64 {
    0.6
}

fn default_content_weight() -> f64 {
    0.4
}

impl Config {
    /// Load configuration from the process environment (and `.env` if present)
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database: envy::from_env()?,
            redis: envy::from_env()?,
            neo4j: envy::from_env()?,
            recommendation: envy::from_env()?,
        })
    }
}
