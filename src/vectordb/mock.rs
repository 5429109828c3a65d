use crate::vectordb::{SearchResult, VectorDbClient, VectorDbError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory index for tests.
///
/// Points either carry a vector (scored by cosine similarity against the query) or a fixed
/// score that is returned for every query.
#[derive(Default)]
pub struct MockVectorDbClient {
    collections: std::sync::RwLock<HashMap<String, HashMap<u64, MockPoint>>>,
    unavailable: AtomicBool,
    searches: AtomicUsize,
}

#[derive(Clone)]
enum MockPoint {
    Vector(Vec<f32>),
    Fixed(f32),
}

impl MockVectorDbClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a point scored by cosine similarity.
    pub fn insert_vector(&self, collection: &str, id: u64, vector: Vec<f32>) {
        self.insert(collection, id, MockPoint::Vector(vector));
    }

    /// Stores a point with a fixed similarity score.
    pub fn insert_scored(&self, collection: &str, id: u64, score: f32) {
        self.insert(collection, id, MockPoint::Fixed(score));
    }

    /// Makes every subsequent search fail as if the index were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn point_count(&self, collection: &str) -> Option<usize> {
        self.collections
            .read()
            .ok()?
            .get(collection)
            .map(|c| c.len())
    }

    fn insert(&self, collection: &str, id: u64, point: MockPoint) {
        if let Ok(mut collections) = self.collections.write() {
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id, point);
        }
    }
}

impl VectorDbClient for MockVectorDbClient {
    async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<SearchResult>, VectorDbError> {
        self.searches.fetch_add(1, Ordering::SeqCst);

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(VectorDbError::SearchFailed {
                collection: collection.to_string(),
                message: "connection refused".to_string(),
            });
        }

        let collections = self
            .collections
            .read()
            .map_err(|_| VectorDbError::SearchFailed {
                collection: collection.to_string(),
                message: "lock poisoned".to_string(),
            })?;

        let points =
            collections
                .get(collection)
                .ok_or_else(|| VectorDbError::CollectionNotFound {
                    collection: collection.to_string(),
                })?;

        let mut results: Vec<SearchResult> = points
            .iter()
            .map(|(&id, point)| {
                let score = match point {
                    MockPoint::Vector(vector) => cosine_similarity(&query, vector),
                    MockPoint::Fixed(score) => *score,
                };
                SearchResult { id, score }
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));

        results.truncate(limit as usize);
        Ok(results)
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
