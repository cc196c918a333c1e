use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of user action on a product.
///
/// Unrecognized names are kept verbatim in `Other` and weigh like a view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InteractionType {
    View,
    Like,
    Cart,
    Purchase,
    Other(String),
}

impl InteractionType {
    pub fn weight(&self) -> f64 {
        match self {
            InteractionType::View => 1.0,
            InteractionType::Like => 3.0,
            InteractionType::Cart => 5.0,
            InteractionType::Purchase => 10.0,
            InteractionType::Other(_) => 1.0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            InteractionType::View => "view",
            InteractionType::Like => "like",
            InteractionType::Cart => "cart",
            InteractionType::Purchase => "purchase",
            InteractionType::Other(name) => name.as_str(),
        }
    }
}

impl From<&str> for InteractionType {
    fn from(value: &str) -> Self {
        match value {
            "view" => InteractionType::View,
            "like" => InteractionType::Like,
            "cart" => InteractionType::Cart,
            "purchase" => InteractionType::Purchase,
            other => InteractionType::Other(other.to_string()),
        }
    }
}

impl From<String> for InteractionType {
    fn from(value: String) -> Self {
        InteractionType::from(value.as_str())
    }
}

impl From<InteractionType> for String {
    fn from(value: InteractionType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded user action. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    #[serde(rename = "type")]
    pub interaction_type: InteractionType,
    pub weight: f64,
    pub timestamp: DateTime<Utc>,
}

impl Interaction {
    /// Build a new interaction; the weight is always derived from the type.
    pub fn new(user_id: Uuid, product_id: Uuid, interaction_type: InteractionType) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            product_id,
            weight: interaction_type.weight(),
            interaction_type,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: f64,
}

/// Purchase receipt. Independent of the purchase-type interactions it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<PurchaseItem>,
    pub total: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Purchase {
    pub fn new(user_id: Uuid, items: Vec<PurchaseItem>, status: impl Into<String>) -> Self {
        let total = items
            .iter()
            .map(|item| item.quantity as f64 * item.unit_price)
            .sum();

        Self {
            id: Uuid::new_v4(),
            user_id,
            items,
            total,
            status: status.into(),
            created_at: Utc::now(),
        }
    }
}

/// Similarity between two users, as computed by the graph backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSimilarity {
    pub user_a: Uuid,
    pub user_b: Uuid,
    pub similarity: f64,
}

/// Accumulated edge between a user and a product for one interaction type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRelation {
    pub product_id: Uuid,
    pub interaction_type: InteractionType,
    pub weight: f64,
    pub count: i64,
}
