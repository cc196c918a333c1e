use super::GraphRepository;
use crate::error::{AppError, Result};
use crate::models::{InteractionType, ProductRelation, UserSimilarity};
use neo4rs::{query, Graph, Query, Row};
use tracing::{debug, warn};
use uuid::Uuid;

/// Neighbours considered when ranking collaborative candidates
const SIMILAR_USER_POOL: i64 = 10;

/// Shared products required before two users count as similar
const MIN_COMMON_PRODUCTS: i64 = 3;

/// Interaction graph stored in Neo4j.
///
/// `(:User)-[:INTERACTED {type, weight, count}]->(:Product)`, one edge per
/// interaction type.
#[derive(Clone)]
pub struct Neo4jGraphRepository {
    graph: Graph,
}

impl Neo4jGraphRepository {
    pub async fn new(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password).await?;
        Ok(Self { graph })
    }

    /// Health check - verify Neo4j connection
    pub async fn health_check(&self) -> Result<bool> {
        let rows = self.fetch(query("RETURN 1 AS health")).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get::<i64>("health").ok())
            .map(|health| health == 1)
            .unwrap_or(false))
    }

    /// Uniqueness constraints on node ids (idempotent)
    pub async fn ensure_constraints(&self) -> Result<()> {
        for cypher in [
            "CREATE CONSTRAINT user_id_unique IF NOT EXISTS FOR (u:User) REQUIRE u.id IS UNIQUE",
            "CREATE CONSTRAINT product_id_unique IF NOT EXISTS FOR (p:Product) REQUIRE p.id IS UNIQUE",
        ] {
            self.graph.run(query(cypher)).await?;
        }
        debug!("Ensured Neo4j constraints");
        Ok(())
    }

    /// Node and edge totals, for operational checks
    pub async fn stats(&self) -> Result<(i64, i64, i64)> {
        let cypher = r#"
            OPTIONAL MATCH (u:User) WITH count(u) AS users
            OPTIONAL MATCH (p:Product) WITH users, count(p) AS products
            OPTIONAL MATCH ()-[r:INTERACTED]->() RETURN users, products, count(r) AS edges
        "#;
        let rows = self.fetch(query(cypher)).await?;
        Ok(rows
            .first()
            .map(|row| {
                (
                    row.get("users").unwrap_or(0),
                    row.get("products").unwrap_or(0),
                    row.get("edges").unwrap_or(0),
                )
            })
            .unwrap_or((0, 0, 0)))
    }

    /// Run a query and collect every row
    async fn fetch(&self, q: Query) -> Result<Vec<Row>> {
        let mut stream = self.graph.execute(q).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Collect `product_id` columns, skipping ids that do not parse
    fn product_ids(rows: &[Row]) -> Vec<Uuid> {
        rows.iter()
            .filter_map(|row| row.get::<String>("product_id").ok())
            .filter_map(|raw| match Uuid::parse_str(&raw) {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(product_id = %raw, error = %e, "Skipping malformed product id in graph");
                    None
                }
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl GraphRepository for Neo4jGraphRepository {
    async fn create_user_product_relation(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        interaction_type: &InteractionType,
        weight: f64,
    ) -> Result<()> {
        let cypher = r#"
            MERGE (u:User {id: $user_id})
            MERGE (p:Product {id: $product_id})
            MERGE (u)-[r:INTERACTED {type: $kind}]->(p)
            ON CREATE SET r.weight = $weight, r.count = 1, r.created_at = timestamp()
            ON MATCH SET r.weight = r.weight + $weight, r.count = r.count + 1,
                         r.updated_at = timestamp()
            RETURN r.count AS count
        "#;

        self.fetch(
            query(cypher)
                .param("user_id", user_id.to_string())
                .param("product_id", product_id.to_string())
                .param("kind", interaction_type.as_str())
                .param("weight", weight),
        )
        .await?;

        debug!(
            user_id = %user_id,
            product_id = %product_id,
            interaction_type = %interaction_type,
            weight,
            "Upserted INTERACTED edge"
        );
        Ok(())
    }

    async fn get_user_product_relations(&self, user_id: Uuid) -> Result<Vec<ProductRelation>> {
        let cypher = r#"
            MATCH (u:User {id: $user_id})-[r:INTERACTED]->(p:Product)
            RETURN p.id AS product_id, r.type AS kind, r.weight AS weight, r.count AS count
            ORDER BY coalesce(r.updated_at, r.created_at) DESC
        "#;

        let rows = self
            .fetch(query(cypher).param("user_id", user_id.to_string()))
            .await?;

        let mut relations = Vec::with_capacity(rows.len());
        for row in rows {
            let raw_id: String = row
                .get("product_id")
                .map_err(|e| AppError::Graph(format!("missing product_id: {}", e)))?;
            let Ok(product_id) = Uuid::parse_str(&raw_id) else {
                warn!(product_id = %raw_id, "Skipping malformed product id in graph");
                continue;
            };
            relations.push(ProductRelation {
                product_id,
                interaction_type: InteractionType::from(
                    row.get::<String>("kind").unwrap_or_default(),
                ),
                weight: row.get("weight").unwrap_or(0.0),
                count: row.get("count").unwrap_or(0),
            });
        }
        Ok(relations)
    }

    async fn find_similar_users(&self, user_id: Uuid, limit: usize) -> Result<Vec<UserSimilarity>> {
        let cypher = r#"
            MATCH (u1:User {id: $user_id})-[r1:INTERACTED]->(p:Product)<-[r2:INTERACTED]-(u2:User)
            WHERE u1 <> u2
            WITH u2, SUM(r1.weight * r2.weight) AS similarity, COUNT(DISTINCT p) AS common
            WHERE common >= $min_common
            RETURN u2.id AS user_id, similarity
            ORDER BY similarity DESC, user_id
            LIMIT $limit
        "#;

        let rows = self
            .fetch(
                query(cypher)
                    .param("user_id", user_id.to_string())
                    .param("min_common", MIN_COMMON_PRODUCTS)
                    .param("limit", limit as i64),
            )
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let other = row.get::<String>("user_id").ok()?;
                let other = Uuid::parse_str(&other).ok()?;
                Some(UserSimilarity {
                    user_a: user_id,
                    user_b: other,
                    similarity: row.get("similarity").unwrap_or(0.0),
                })
            })
            .collect())
    }

    async fn get_collaborative_recommendations(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Uuid>> {
        let cypher = r#"
            MATCH (u1:User {id: $user_id})-[r1:INTERACTED]->(:Product)<-[r2:INTERACTED]-(u2:User)
            WHERE u1 <> u2
            WITH u1, u2, SUM(r1.weight * r2.weight) AS similarity
            ORDER BY similarity DESC
            LIMIT $pool
            MATCH (u2)-[r:INTERACTED]->(p:Product)
            WHERE NOT EXISTS { MATCH (u1)-[:INTERACTED]->(p) }
            WITH p, SUM(r.weight * similarity) AS score
            RETURN p.id AS product_id, score
            ORDER BY score DESC, product_id
            LIMIT $limit
        "#;

        let rows = self
            .fetch(
                query(cypher)
                    .param("user_id", user_id.to_string())
                    .param("pool", SIMILAR_USER_POOL)
                    .param("limit", limit as i64),
            )
            .await?;

        Ok(Self::product_ids(&rows))
    }

    async fn get_similar_products(&self, product_id: Uuid, limit: usize) -> Result<Vec<Uuid>> {
        let cypher = r#"
            MATCH (p1:Product {id: $product_id})<-[r1:INTERACTED]-(:User)-[r2:INTERACTED]->(p2:Product)
            WHERE p1 <> p2
            WITH p2, SUM(r1.weight * r2.weight) AS similarity
            RETURN p2.id AS product_id, similarity
            ORDER BY similarity DESC, product_id
            LIMIT $limit
        "#;

        let rows = self
            .fetch(
                query(cypher)
                    .param("product_id", product_id.to_string())
                    .param("limit", limit as i64),
            )
            .await?;

        Ok(Self::product_ids(&rows))
    }

    async fn get_frequently_bought_together(
        &self,
        product_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Uuid>> {
        let cypher = r#"
            MATCH (p1:Product {id: $product_id})<-[:INTERACTED {type: 'purchase'}]-(u:User)
                  -[:INTERACTED {type: 'purchase'}]->(p2:Product)
            WHERE p1 <> p2
            WITH p2, COUNT(DISTINCT u) AS frequency
            RETURN p2.id AS product_id, frequency
            ORDER BY frequency DESC, product_id
            LIMIT $limit
        "#;

        let rows = self
            .fetch(
                query(cypher)
                    .param("product_id", product_id.to_string())
                    .param("limit", limit as i64),
            )
            .await?;

        Ok(Self::product_ids(&rows))
    }

    async fn calculate_user_similarity(&self, user_a: Uuid, user_b: Uuid) -> Result<f64> {
        let cypher = r#"
            OPTIONAL MATCH (a:User {id: $user_a})-[:INTERACTED]->(shared:Product)<-[:INTERACTED]-(b:User {id: $user_b})
            WITH COUNT(DISTINCT shared) AS intersection
            OPTIONAL MATCH (a:User {id: $user_a})-[:INTERACTED]->(pa:Product)
            WITH intersection, COUNT(DISTINCT pa) AS count_a
            OPTIONAL MATCH (b:User {id: $user_b})-[:INTERACTED]->(pb:Product)
            WITH intersection, count_a, COUNT(DISTINCT pb) AS count_b
            RETURN CASE WHEN count_a + count_b - intersection = 0 THEN 0.0
                        ELSE toFloat(intersection) / (count_a + count_b - intersection)
                   END AS similarity
        "#;

        let rows = self
            .fetch(
                query(cypher)
                    .param("user_a", user_a.to_string())
                    .param("user_b", user_b.to_string()),
            )
            .await?;

        Ok(rows
            .first()
            .and_then(|row| row.get::<f64>("similarity").ok())
            .unwrap_or(0.0))
    }

    async fn get_product_popularity_score(&self, product_id: Uuid) -> Result<f64> {
        let cypher = r#"
            OPTIONAL MATCH (:Product {id: $product_id})<-[r:INTERACTED]-(:User)
            RETURN coalesce(SUM(r.weight), 0.0) AS popularity
        "#;

        let rows = self
            .fetch(query(cypher).param("product_id", product_id.to_string()))
            .await?;

        Ok(rows
            .first()
            .and_then(|row| row.get::<f64>("popularity").ok())
            .unwrap_or(0.0))
    }
}
