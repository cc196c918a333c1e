use super::cache::RecommendationCache;
use crate::error::{AppError, Result};
use crate::models::{Interaction, InteractionType, Purchase, PurchaseItem};
use crate::repository::{GraphRepository, InteractionRepository};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Write path: records interactions and purchases.
///
/// The log write comes first and is authoritative. The graph is updated
/// afterwards with no shared transaction, so it may lag the log.
#[derive(Clone)]
pub struct InteractionService {
    interactions: Arc<dyn InteractionRepository>,
    graph: Arc<dyn GraphRepository>,
    cache: RecommendationCache,
}

impl InteractionService {
    pub fn new(
        interactions: Arc<dyn InteractionRepository>,
        graph: Arc<dyn GraphRepository>,
        cache: RecommendationCache,
    ) -> Self {
        Self {
            interactions,
            graph,
            cache,
        }
    }

    pub async fn record_interaction(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        interaction_type: InteractionType,
    ) -> Result<()> {
        let interaction = Interaction::new(user_id, product_id, interaction_type);

        // No graph signal without a durable log entry
        self.interactions.create(&interaction).await?;

        let graph_result = self.apply_to_graph(&interaction).await;

        // The log changed either way
        self.invalidate(user_id).await;
        graph_result?;

        self.bump_counters(&interaction).await;
        Ok(())
    }

    /// Log one purchase interaction per line item, store the receipt, then
    /// update the graph.
    ///
    /// The receipt does not depend on the graph: a failed upsert is returned
    /// only after the receipt is persisted and the remaining items were
    /// applied.
    pub async fn record_purchase(
        &self,
        user_id: Uuid,
        items: Vec<PurchaseItem>,
        status: &str,
    ) -> Result<Purchase> {
        validate_items(&items)?;

        let logged: Vec<Interaction> = items
            .iter()
            .map(|item| Interaction::new(user_id, item.product_id, InteractionType::Purchase))
            .collect();

        for interaction in &logged {
            if let Err(e) = self.interactions.create(interaction).await {
                self.invalidate(user_id).await;
                return Err(e);
            }
        }

        let purchase = Purchase::new(user_id, items, status);
        if let Err(e) = self.interactions.create_purchase(&purchase).await {
            self.invalidate(user_id).await;
            return Err(e);
        }

        let mut applied = Vec::with_capacity(logged.len());
        let mut first_graph_error = None;
        for interaction in &logged {
            match self.apply_to_graph(interaction).await {
                Ok(()) => applied.push(interaction),
                Err(e) => {
                    first_graph_error.get_or_insert(e);
                }
            }
        }

        self.invalidate(user_id).await;
        for interaction in applied {
            self.bump_counters(interaction).await;
        }

        if let Some(e) = first_graph_error {
            return Err(e);
        }

        info!(
            user_id = %user_id,
            purchase_id = %purchase.id,
            total = purchase.total,
            "Recorded purchase"
        );
        Ok(purchase)
    }

    async fn apply_to_graph(&self, interaction: &Interaction) -> Result<()> {
        let result = self
            .graph
            .create_user_product_relation(
                interaction.user_id,
                interaction.product_id,
                &interaction.interaction_type,
                interaction.weight,
            )
            .await;
        if let Err(e) = &result {
            warn!(
                user_id = %interaction.user_id,
                product_id = %interaction.product_id,
                error = %e,
                "Interaction logged but graph update failed"
            );
        }
        result
    }

    /// Best-effort view and popularity bookkeeping
    async fn bump_counters(&self, interaction: &Interaction) {
        if interaction.interaction_type == InteractionType::View {
            self.cache.record_view(interaction.product_id).await;
        }
        self.cache
            .record_popularity(interaction.product_id, interaction.weight)
            .await;
    }

    async fn invalidate(&self, user_id: Uuid) {
        if let Err(e) = self.cache.invalidate_user(user_id).await {
            warn!(user_id = %user_id, error = %e, "Failed to invalidate recommendations");
        }
    }

    /// Store a receipt only. Callers record the matching interactions.
    pub async fn create_purchase(&self, purchase: &Purchase) -> Result<()> {
        self.interactions.create_purchase(purchase).await
    }

    pub async fn get_user_purchase_history(&self, user_id: Uuid) -> Result<Vec<Purchase>> {
        self.interactions.get_user_purchase_history(user_id).await
    }

    pub async fn get_product_interaction_counts(
        &self,
        product_id: Uuid,
    ) -> Result<HashMap<InteractionType, i64>> {
        self.interactions.get_interaction_counts(product_id).await
    }
}

fn validate_items(items: &[PurchaseItem]) -> Result<()> {
    if items.is_empty() {
        return Err(AppError::Validation("purchase has no items".to_string()));
    }
    for item in items {
        if item.quantity < 1 {
            return Err(AppError::Validation(format!(
                "quantity for product {} must be at least 1",
                item.product_id
            )));
        }
        if item.unit_price.is_nan() || item.unit_price < 0.0 {
            return Err(AppError::Validation(format!(
                "price for product {} must not be negative",
                item.product_id
            )));
        }
    }
    Ok(())
}
