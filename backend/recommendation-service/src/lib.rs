//! Hybrid product recommendation engine.
//!
//! Combines collaborative filtering over a user/product interaction graph
//! with content-based filtering over each user's category history, and
//! falls back to global popularity for users without enough history.

pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use config::{Config, RecommendationConfig};
pub use error::{AppError, Result};
pub use services::{InteractionService, RecommendationService, ScoreMerger};

use rec_cache::RedisCache;
use repository::{Neo4jGraphRepository, PostgresInteractionRepository, PostgresProductRepository};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

/// Connect every backend named in `config` and assemble the engine
pub async fn connect(config: &Config) -> Result<RecommendationService> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    info!(max_connections = config.database.max_connections, "Connected to PostgreSQL");

    let graph = Neo4jGraphRepository::new(
        &config.neo4j.uri,
        &config.neo4j.user,
        &config.neo4j.password,
    )
    .await?;
    info!(uri = %config.neo4j.uri, "Connected to Neo4j");

    let cache = RedisCache::connect(&config.redis.url).await?;
    info!("Connected to Redis");

    Ok(RecommendationService::new(
        Arc::new(PostgresProductRepository::new(pool.clone())),
        Arc::new(PostgresInteractionRepository::new(pool)),
        Arc::new(graph),
        Arc::new(cache),
        config.recommendation.clone(),
    ))
}
