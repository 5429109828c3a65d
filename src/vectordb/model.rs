use qdrant_client::qdrant::ScoredPoint;
use qdrant_client::qdrant::point_id::PointIdOptions;

/// A company point returned by a similarity search. The point id is the company id.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub id: u64,
    pub score: f32,
}

impl SearchResult {
    /// Converts a Qdrant point; UUID-keyed points are skipped.
    pub fn from_scored_point(point: ScoredPoint) -> Option<Self> {
        let id = match point.id.and_then(|pid| pid.point_id_options) {
            Some(PointIdOptions::Num(n)) => n,
            _ => return None,
        };

        Some(SearchResult {
            id,
            score: point.score,
        })
    }
}
