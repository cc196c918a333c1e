use super::InteractionRepository;
use crate::error::Result;
use crate::models::{Interaction, InteractionType, Purchase, PurchaseItem};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct InteractionRow {
    id: Uuid,
    user_id: Uuid,
    product_id: Uuid,
    interaction_type: String,
    weight: f64,
    created_at: DateTime<Utc>,
}

impl From<InteractionRow> for Interaction {
    fn from(row: InteractionRow) -> Self {
        Interaction {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            interaction_type: InteractionType::from(row.interaction_type),
            weight: row.weight,
            timestamp: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PurchaseRow {
    id: Uuid,
    user_id: Uuid,
    total: f64,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct PurchaseItemRow {
    purchase_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    unit_price: f64,
}

/// PostgreSQL-backed interaction log and purchase store
#[derive(Clone)]
pub struct PostgresInteractionRepository {
    pool: PgPool,
}

impl PostgresInteractionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl InteractionRepository for PostgresInteractionRepository {
    async fn create(&self, interaction: &Interaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO interactions (id, user_id, product_id, interaction_type, weight, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(interaction.id)
        .bind(interaction.user_id)
        .bind(interaction.product_id)
        .bind(interaction.interaction_type.as_str())
        .bind(interaction.weight)
        .bind(interaction.timestamp)
        .execute(&self.pool)
        .await?;

        debug!(
            user_id = %interaction.user_id,
            product_id = %interaction.product_id,
            interaction_type = %interaction.interaction_type,
            "Stored interaction"
        );
        Ok(())
    }

    async fn get_user_interactions(&self, user_id: Uuid, limit: usize) -> Result<Vec<Interaction>> {
        let rows = sqlx::query_as::<_, InteractionRow>(
            r#"
            SELECT id, user_id, product_id, interaction_type, weight, created_at
            FROM interactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Interaction::from).collect())
    }

    async fn get_product_interactions(
        &self,
        product_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Interaction>> {
        let rows = sqlx::query_as::<_, InteractionRow>(
            r#"
            SELECT id, user_id, product_id, interaction_type, weight, created_at
            FROM interactions
            WHERE product_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(product_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Interaction::from).collect())
    }

    async fn get_interaction_counts(
        &self,
        product_id: Uuid,
    ) -> Result<HashMap<InteractionType, i64>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT interaction_type, COUNT(*)
            FROM interactions
            WHERE product_id = $1
            GROUP BY interaction_type
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(kind, count)| (InteractionType::from(kind), count))
            .collect())
    }

    async fn create_purchase(&self, purchase: &Purchase) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO purchases (id, user_id, total, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(purchase.id)
        .bind(purchase.user_id)
        .bind(purchase.total)
        .bind(&purchase.status)
        .bind(purchase.created_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in purchase.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO purchase_items (purchase_id, position, product_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(purchase.id)
            .bind(position as i32)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(
            purchase_id = %purchase.id,
            user_id = %purchase.user_id,
            items = purchase.items.len(),
            "Stored purchase"
        );
        Ok(())
    }

    async fn get_user_purchase_history(&self, user_id: Uuid) -> Result<Vec<Purchase>> {
        let purchases = sqlx::query_as::<_, PurchaseRow>(
            r#"
            SELECT id, user_id, total, status, created_at
            FROM purchases
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        if purchases.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = purchases.iter().map(|p| p.id).collect();
        let items = sqlx::query_as::<_, PurchaseItemRow>(
            r#"
            SELECT purchase_id, product_id, quantity, unit_price
            FROM purchase_items
            WHERE purchase_id = ANY($1)
            ORDER BY purchase_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_purchase: HashMap<Uuid, Vec<PurchaseItem>> = HashMap::new();
        for row in items {
            items_by_purchase
                .entry(row.purchase_id)
                .or_default()
                .push(PurchaseItem {
                    product_id: row.product_id,
                    quantity: row.quantity,
                    unit_price: row.unit_price,
                });
        }

        Ok(purchases
            .into_iter()
            .map(|row| Purchase {
                items: items_by_purchase.remove(&row.id).unwrap_or_default(),
                id: row.id,
                user_id: row.user_id,
                total: row.total,
                status: row.status,
                created_at: row.created_at,
            })
            .collect())
    }
}
