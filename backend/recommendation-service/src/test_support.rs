//! Fixtures shared by unit tests

use crate::models::Product;
use chrono::Utc;
use uuid::Uuid;

pub fn product(id: Uuid, category: &str, rating: f64) -> Product {
    let now = Utc::now();
    Product {
        id,
        name: format!("product-{}", &id.to_string()[..8]),
        description: String::new(),
        category: category.to_string(),
        price: 9.99,
        stock: 10,
        tags: Vec::new(),
        rating,
        review_count: 0,
        created_at: now,
        updated_at: now,
    }
}
