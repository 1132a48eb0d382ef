//! Visual similarity search over precomputed image features
//!
//! Feature vectors are extracted offline (one per micrograph) and stored as a
//! JSON object mapping entry id to vector. The catalog only ranks them.

use std::collections::HashMap;
use std::path::Path;

use tracing::info;
use uhcsdb_common::{Error, Result};

/// Ranked neighbors of a query entry, nearest first
///
/// `ids` and `scores` are parallel; scores are non-decreasing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Neighbors {
    pub ids: Vec<i64>,
    pub scores: Vec<f64>,
}

impl Neighbors {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Nearest-neighbor lookup over entry feature vectors
pub trait NeighborIndex: Send + Sync {
    /// Up to `k` nearest entries to `entry_id`, excluding the entry itself
    fn query(&self, entry_id: i64, k: usize) -> Result<Neighbors>;

    /// Number of indexed entries
    fn len(&self) -> usize;
}

/// Exhaustive Euclidean index over every loaded vector
///
/// The collection is a few thousand micrographs, so a linear scan per query is
/// cheaper than building and holding a graph index.
pub struct FeatureIndex {
    ids: Vec<i64>,
    vectors: Vec<Box<[f32]>>,
    position: HashMap<i64, usize>,
}

impl FeatureIndex {
    /// Build from (entry id, vector) pairs; all vectors must share one dimension
    pub fn from_vectors(entries: impl IntoIterator<Item = (i64, Vec<f32>)>) -> Result<Self> {
        let mut entries: Vec<(i64, Vec<f32>)> = entries.into_iter().collect();
        entries.sort_by_key(|(id, _)| *id);

        let dim = entries.first().map(|(_, v)| v.len()).unwrap_or(0);
        let mut ids = Vec::with_capacity(entries.len());
        let mut vectors = Vec::with_capacity(entries.len());
        let mut position = HashMap::with_capacity(entries.len());

        for (id, vector) in entries {
            if vector.len() != dim {
                return Err(Error::MissingData(format!(
                    "feature vector for entry {} has dimension {}, expected {}",
                    id,
                    vector.len(),
                    dim
                )));
            }
            position.insert(id, ids.len());
            ids.push(id);
            vectors.push(vector.into_boxed_slice());
        }

        Ok(Self {
            ids,
            vectors,
            position,
        })
    }

    /// Load a JSON feature file: `{"<entry id>": [f32, ...], ...}`
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            Error::MissingData(format!("feature file {}: {}", path.display(), e))
        })?;

        let raw: HashMap<String, Vec<f32>> = serde_json::from_slice(&bytes).map_err(|e| {
            Error::MissingData(format!("feature file {}: {}", path.display(), e))
        })?;

        let entries = raw
            .into_iter()
            .map(|(key, vector)| {
                key.parse::<i64>()
                    .map(|id| (id, vector))
                    .map_err(|_| {
                        Error::MissingData(format!(
                            "feature file {}: bad entry id {:?}",
                            path.display(),
                            key
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let index = Self::from_vectors(entries)?;
        info!(
            "Loaded {} feature vectors from {}",
            index.ids.len(),
            path.display()
        );
        Ok(index)
    }
}

fn euclidean(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = f64::from(x) - f64::from(y);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

impl NeighborIndex for FeatureIndex {
    fn query(&self, entry_id: i64, k: usize) -> Result<Neighbors> {
        let &query_pos = self.position.get(&entry_id).ok_or_else(|| {
            Error::MissingData(format!("no feature vector for entry {}", entry_id))
        })?;
        let query = &self.vectors[query_pos];

        let mut ranked: Vec<(f64, i64)> = self
            .ids
            .iter()
            .zip(self.vectors.iter())
            .filter(|(id, _)| **id != entry_id)
            .map(|(id, v)| (euclidean(query, v), *id))
            .collect();

        // Ties resolve by id so repeated queries return identical pages
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        ranked.truncate(k);

        let (scores, ids): (Vec<f64>, Vec<i64>) = ranked.into_iter().unzip();
        Ok(Neighbors { ids, scores })
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}
