mod graph_repository;
mod postgres_catalog;
mod postgres_interactions;
mod r#trait;

pub use graph_repository::Neo4jGraphRepository;
pub use postgres_catalog::PostgresProductRepository;
pub use postgres_interactions::PostgresInteractionRepository;
pub use r#trait::{GraphRepository, InteractionRepository, ProductRepository};

#[cfg(test)]
pub use r#trait::{MockGraphRepository, MockInteractionRepository, MockProductRepository};
