//! In-memory collaborators for engine integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use rec_cache::{CacheError, CacheResult, CacheStore};
use recommendation_service::error::{AppError, Result};
use recommendation_service::models::{
    Interaction, InteractionType, Product, ProductRelation, Purchase, UserSimilarity,
};
use recommendation_service::repository::{
    GraphRepository, InteractionRepository, ProductRepository,
};
use recommendation_service::{RecommendationConfig, RecommendationService};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub fn product(category: &str, rating: f64, review_count: i32) -> Product {
    let now = Utc::now();
    let id = Uuid::new_v4();
    Product {
        id,
        name: format!("{} item {}", category, &id.to_string()[..8]),
        description: format!("A {} product", category),
        category: category.to_string(),
        price: 19.99,
        stock: 5,
        tags: vec![category.to_string()],
        rating,
        review_count,
        created_at: now,
        updated_at: now,
    }
}

// ---- catalog ----

#[derive(Default)]
pub struct InMemoryCatalog {
    products: Mutex<Vec<Product>>,
}

impl InMemoryCatalog {
    pub fn add(&self, product: Product) -> Product {
        self.products.lock().unwrap().push(product.clone());
        product
    }

    pub fn remove(&self, id: Uuid) {
        self.products.lock().unwrap().retain(|p| p.id != id);
    }

    fn ranked(mut products: Vec<Product>) -> Vec<Product> {
        products.sort_by(|a, b| {
            b.rating
                .partial_cmp(&a.rating)
                .unwrap_or(Ordering::Equal)
                .then(b.review_count.cmp(&a.review_count))
        });
        products
    }
}

#[async_trait]
impl ProductRepository for InMemoryCatalog {
    async fn get_by_id(&self, id: Uuid) -> Result<Product> {
        self.products
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("product {}", id)))
    }

    async fn get_by_category(&self, category: &str, limit: usize) -> Result<Vec<Product>> {
        let matching: Vec<Product> = self
            .products
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect();
        Ok(Self::ranked(matching).into_iter().take(limit).collect())
    }

    async fn get_popular(&self, limit: usize) -> Result<Vec<Product>> {
        let all = self.products.lock().unwrap().clone();
        Ok(Self::ranked(all).into_iter().take(limit).collect())
    }

    async fn search(
        &self,
        text: &str,
        category: Option<String>,
        limit: usize,
    ) -> Result<Vec<Product>> {
        let needle = text.to_lowercase();
        let matching: Vec<Product> = self
            .products
            .lock()
            .unwrap()
            .iter()
            .filter(|p| category.as_deref().map_or(true, |c| p.category == c))
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
                    || p.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        Ok(Self::ranked(matching).into_iter().take(limit).collect())
    }
}

// ---- interaction log ----

#[derive(Default)]
pub struct InMemoryInteractionLog {
    interactions: Mutex<Vec<Interaction>>,
    purchases: Mutex<Vec<Purchase>>,
    pub fail_writes: AtomicBool,
    pub reads: AtomicUsize,
}

impl InMemoryInteractionLog {
    pub fn len(&self) -> usize {
        self.interactions.lock().unwrap().len()
    }

    pub fn seed(&self, interaction: Interaction) {
        self.interactions.lock().unwrap().push(interaction);
    }
}

#[async_trait]
impl InteractionRepository for InMemoryInteractionLog {
    async fn create(&self, interaction: &Interaction) -> Result<()> {
        if self.fail_writes.load(AtomicOrdering::SeqCst) {
            return Err(AppError::Database("log unavailable".into()));
        }
        self.interactions.lock().unwrap().push(interaction.clone());
        Ok(())
    }

    async fn get_user_interactions(&self, user_id: Uuid, limit: usize) -> Result<Vec<Interaction>> {
        self.reads.fetch_add(1, AtomicOrdering::SeqCst);
        let mut mine: Vec<Interaction> = self
            .interactions
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        mine.reverse();
        mine.truncate(limit);
        Ok(mine)
    }

    async fn get_product_interactions(
        &self,
        product_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Interaction>> {
        let mut matching: Vec<Interaction> = self
            .interactions
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.product_id == product_id)
            .cloned()
            .collect();
        matching.reverse();
        matching.truncate(limit);
        Ok(matching)
    }

    async fn get_interaction_counts(
        &self,
        product_id: Uuid,
    ) -> Result<HashMap<InteractionType, i64>> {
        let mut counts = HashMap::new();
        for i in self.interactions.lock().unwrap().iter() {
            if i.product_id == product_id {
                *counts.entry(i.interaction_type.clone()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn create_purchase(&self, purchase: &Purchase) -> Result<()> {
        if self.fail_writes.load(AtomicOrdering::SeqCst) {
            return Err(AppError::Database("log unavailable".into()));
        }
        self.purchases.lock().unwrap().push(purchase.clone());
        Ok(())
    }

    async fn get_user_purchase_history(&self, user_id: Uuid) -> Result<Vec<Purchase>> {
        let mut mine: Vec<Purchase> = self
            .purchases
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        mine.reverse();
        Ok(mine)
    }
}

// ---- graph ----

type EdgeKey = (Uuid, Uuid, InteractionType);

/// Accumulating user/product graph with failure and stall injection
#[derive(Default)]
pub struct InMemoryGraph {
    edges: Mutex<HashMap<EdgeKey, (f64, i64)>>,
    pub fail: AtomicBool,
    pub stall: AtomicBool,
    pub calls: AtomicUsize,
    pub in_flight: Arc<AtomicUsize>,
}

/// Decrements the in-flight counter when a call finishes or is dropped
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, AtomicOrdering::SeqCst);
    }
}

impl InMemoryGraph {
    pub fn edge(&self, user_id: Uuid, product_id: Uuid, kind: InteractionType) -> Option<(f64, i64)> {
        self.edges
            .lock()
            .unwrap()
            .get(&(user_id, product_id, kind))
            .copied()
    }

    async fn enter(&self) -> Result<InFlight> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.in_flight.fetch_add(1, AtomicOrdering::SeqCst);
        let guard = InFlight(self.in_flight.clone());
        if self.stall.load(AtomicOrdering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail.load(AtomicOrdering::SeqCst) {
            return Err(AppError::Graph("graph unavailable".into()));
        }
        Ok(guard)
    }

    /// Product weights per user, summed over interaction types
    fn weights_by_user(&self) -> HashMap<Uuid, HashMap<Uuid, f64>> {
        let mut by_user: HashMap<Uuid, HashMap<Uuid, f64>> = HashMap::new();
        for ((user, product, _), (weight, _)) in self.edges.lock().unwrap().iter() {
            *by_user.entry(*user).or_default().entry(*product).or_insert(0.0) += weight;
        }
        by_user
    }

    fn top(scores: HashMap<Uuid, f64>, limit: usize) -> Vec<Uuid> {
        let mut ranked: Vec<(Uuid, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        ranked.into_iter().take(limit).map(|(id, _)| id).collect()
    }
}

#[async_trait]
impl GraphRepository for InMemoryGraph {
    async fn create_user_product_relation(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        interaction_type: &InteractionType,
        weight: f64,
    ) -> Result<()> {
        let _guard = self.enter().await?;
        let mut edges = self.edges.lock().unwrap();
        let edge = edges
            .entry((user_id, product_id, interaction_type.clone()))
            .or_insert((0.0, 0));
        edge.0 += weight;
        edge.1 += 1;
        Ok(())
    }

    async fn get_user_product_relations(&self, user_id: Uuid) -> Result<Vec<ProductRelation>> {
        let _guard = self.enter().await?;
        Ok(self
            .edges
            .lock()
            .unwrap()
            .iter()
            .filter(|((user, _, _), _)| *user == user_id)
            .map(|((_, product, kind), (weight, count))| ProductRelation {
                product_id: *product,
                interaction_type: kind.clone(),
                weight: *weight,
                count: *count,
            })
            .collect())
    }

    async fn find_similar_users(&self, user_id: Uuid, limit: usize) -> Result<Vec<UserSimilarity>> {
        let _guard = self.enter().await?;
        let by_user = self.weights_by_user();
        let Some(mine) = by_user.get(&user_id) else {
            return Ok(Vec::new());
        };

        let mut scores = HashMap::new();
        for (other, theirs) in &by_user {
            if *other == user_id {
                continue;
            }
            let shared: Vec<&Uuid> = mine.keys().filter(|p| theirs.contains_key(p)).collect();
            if shared.len() >= 3 {
                let similarity = shared.iter().map(|p| mine[*p] * theirs[*p]).sum::<f64>();
                scores.insert(*other, similarity);
            }
        }

        let ranked = Self::top(scores.clone(), limit);
        Ok(ranked
            .into_iter()
            .map(|other| UserSimilarity {
                user_a: user_id,
                user_b: other,
                similarity: scores[&other],
            })
            .collect())
    }

    async fn get_collaborative_recommendations(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Uuid>> {
        let _guard = self.enter().await?;
        let by_user = self.weights_by_user();
        let Some(mine) = by_user.get(&user_id) else {
            return Ok(Vec::new());
        };

        let mut scores: HashMap<Uuid, f64> = HashMap::new();
        for (other, theirs) in &by_user {
            if *other == user_id {
                continue;
            }
            let similarity: f64 = mine
                .iter()
                .filter_map(|(p, w)| theirs.get(p).map(|t| w * t))
                .sum();
            if similarity == 0.0 {
                continue;
            }
            for (product, weight) in theirs {
                if !mine.contains_key(product) {
                    *scores.entry(*product).or_insert(0.0) += weight * similarity;
                }
            }
        }
        Ok(Self::top(scores, limit))
    }

    async fn get_similar_products(&self, product_id: Uuid, limit: usize) -> Result<Vec<Uuid>> {
        let _guard = self.enter().await?;
        let mut scores: HashMap<Uuid, f64> = HashMap::new();
        for products in self.weights_by_user().values() {
            if let Some(anchor) = products.get(&product_id) {
                for (other, weight) in products {
                    if *other != product_id {
                        *scores.entry(*other).or_insert(0.0) += anchor * weight;
                    }
                }
            }
        }
        Ok(Self::top(scores, limit))
    }

    async fn get_frequently_bought_together(
        &self,
        product_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Uuid>> {
        let _guard = self.enter().await?;
        let mut bought: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
        for (user, product, kind) in self.edges.lock().unwrap().keys() {
            if *kind == InteractionType::Purchase {
                bought.entry(*user).or_default().insert(*product);
            }
        }

        let mut scores: HashMap<Uuid, f64> = HashMap::new();
        for products in bought.values() {
            if products.contains(&product_id) {
                for other in products {
                    if *other != product_id {
                        *scores.entry(*other).or_insert(0.0) += 1.0;
                    }
                }
            }
        }
        Ok(Self::top(scores, limit))
    }

    async fn calculate_user_similarity(&self, user_a: Uuid, user_b: Uuid) -> Result<f64> {
        let _guard = self.enter().await?;
        let by_user = self.weights_by_user();
        let a: HashSet<Uuid> = by_user.get(&user_a).map(|m| m.keys().copied().collect()).unwrap_or_default();
        let b: HashSet<Uuid> = by_user.get(&user_b).map(|m| m.keys().copied().collect()).unwrap_or_default();
        let union = a.union(&b).count();
        if union == 0 {
            return Ok(0.0);
        }
        Ok(a.intersection(&b).count() as f64 / union as f64)
    }

    async fn get_product_popularity_score(&self, product_id: Uuid) -> Result<f64> {
        let _guard = self.enter().await?;
        Ok(self
            .edges
            .lock()
            .unwrap()
            .iter()
            .filter(|((_, product, _), _)| *product == product_id)
            .map(|(_, (weight, _))| weight)
            .sum())
    }
}

// ---- cache ----

#[derive(Default)]
pub struct InMemoryCache {
    values: Mutex<HashMap<String, String>>,
    counters: Mutex<HashMap<String, i64>>,
    sorted: Mutex<HashMap<String, HashMap<String, f64>>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub sets: AtomicUsize,
}

impl InMemoryCache {
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn put_raw(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn counter(&self, key: &str) -> i64 {
        self.counters.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub fn member_score(&self, key: &str, member: &str) -> Option<f64> {
        self.sorted
            .lock()
            .unwrap()
            .get(key)
            .and_then(|set| set.get(member).copied())
    }

    fn check_write(&self) -> CacheResult<()> {
        if self.fail_writes.load(AtomicOrdering::SeqCst) {
            return Err(CacheError::Unavailable("write refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        if self.fail_reads.load(AtomicOrdering::SeqCst) {
            return Err(CacheError::Unavailable("read refused".into()));
        }
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str, _ttl_secs: u64) -> CacheResult<()> {
        self.sets.fetch_add(1, AtomicOrdering::SeqCst);
        self.check_write()?;
        self.put_raw(key, value);
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        self.check_write()?;
        self.values.lock().unwrap().remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str) -> CacheResult<i64> {
        self.check_write()?;
        let mut counters = self.counters.lock().unwrap();
        let value = counters.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn zincr_by(&self, key: &str, member: &str, delta: f64) -> CacheResult<f64> {
        self.check_write()?;
        let mut sorted = self.sorted.lock().unwrap();
        let score = sorted
            .entry(key.to_string())
            .or_default()
            .entry(member.to_string())
            .or_insert(0.0);
        *score += delta;
        Ok(*score)
    }

    async fn ztop(&self, key: &str, n: usize) -> CacheResult<Vec<String>> {
        if self.fail_reads.load(AtomicOrdering::SeqCst) {
            return Err(CacheError::Unavailable("read refused".into()));
        }
        let sorted = self.sorted.lock().unwrap();
        let Some(set) = sorted.get(key) else {
            return Ok(Vec::new());
        };
        let mut members: Vec<(&String, &f64)> = set.iter().collect();
        members.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(b.0)));
        Ok(members.into_iter().take(n).map(|(m, _)| m.clone()).collect())
    }
}

// ---- harness ----

pub struct Harness {
    pub catalog: Arc<InMemoryCatalog>,
    pub log: Arc<InMemoryInteractionLog>,
    pub graph: Arc<InMemoryGraph>,
    pub cache: Arc<InMemoryCache>,
    pub service: RecommendationService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(RecommendationConfig::default())
    }

    pub fn with_config(config: RecommendationConfig) -> Self {
        let catalog = Arc::new(InMemoryCatalog::default());
        let log = Arc::new(InMemoryInteractionLog::default());
        let graph = Arc::new(InMemoryGraph::default());
        let cache = Arc::new(InMemoryCache::default());
        let service = RecommendationService::new(
            catalog.clone(),
            log.clone(),
            graph.clone(),
            cache.clone(),
            config,
        );
        Self {
            catalog,
            log,
            graph,
            cache,
            service,
        }
    }

    /// Record `kind` for every product through the engine's write path
    pub async fn interact(&self, user_id: Uuid, products: &[&Product], kind: InteractionType) {
        for product in products {
            self.service
                .record_interaction(user_id, product.id, kind.clone())
                .await
                .expect("record interaction");
        }
    }
}
