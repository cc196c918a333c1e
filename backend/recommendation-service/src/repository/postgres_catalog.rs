use super::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::Product;
use sqlx::PgPool;
use uuid::Uuid;

const PRODUCT_COLUMNS: &str = "id, name, description, category, price, stock, tags, rating, \
                               review_count, created_at, updated_at";

/// PostgreSQL-backed product catalog
#[derive(Clone)]
pub struct PostgresProductRepository {
    pool: PgPool,
}

impl PostgresProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Product> {
        let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {}", id)))
    }

    async fn get_by_category(&self, category: &str, limit: usize) -> Result<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE category = $1 \
             ORDER BY rating DESC, review_count DESC, id LIMIT $2",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(category)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn get_popular(&self, limit: usize) -> Result<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products ORDER BY rating DESC, review_count DESC, id LIMIT $1",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn search(
        &self,
        text: &str,
        category: Option<String>,
        limit: usize,
    ) -> Result<Vec<Product>> {
        let pattern = format!("%{}%", text);
        let sql = format!(
            "SELECT {} FROM products \
             WHERE (name ILIKE $1 OR description ILIKE $1 \
                    OR EXISTS (SELECT 1 FROM unnest(tags) t WHERE t ILIKE $1)) \
               AND ($2::text IS NULL OR category = $2) \
             ORDER BY rating DESC, review_count DESC, id LIMIT $3",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(pattern)
            .bind(category)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }
}
