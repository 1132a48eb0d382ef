//! Precomputed 2-D embeddings
//!
//! Embeddings are computed offline. Each representation file is a JSON object
//! of groups, each group mapping entry id to an `[x, y]` pair:
//!
//! ```text
//! static/tsne/<representation>    {"perplexity-40": {"1": [x, y], ...}}
//! static/embed/<representation>   {"PCA": {...}, "MDS": {...}, ...}
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::info;
use uhcsdb_common::{Error, Result, Settings};

use crate::controls::Manifold;

/// Group holding t-SNE coordinates
pub const TSNE_GROUP: &str = "perplexity-40";

/// Source of 2-D coordinates for a (representation, manifold) pair
pub trait CoordinateSource: Send + Sync {
    /// Coordinates for `keys`, in the same order
    ///
    /// Fails with [`Error::MissingData`] if the file, the group, or any key is absent.
    fn load(&self, representation: &str, manifold: Manifold, keys: &[i64]) -> Result<Vec<[f64; 2]>>;
}

/// Reads embeddings from the JSON cache folders under `<data_dir>/static`
#[derive(Debug, Clone)]
pub struct CachedEmbeddings {
    tsne_dir: PathBuf,
    embed_dir: PathBuf,
}

impl CachedEmbeddings {
    pub fn new(settings: &Settings) -> Self {
        Self {
            tsne_dir: settings.tsne_dir(),
            embed_dir: settings.embed_dir(),
        }
    }

    fn locate(&self, representation: &str, manifold: Manifold) -> Result<(PathBuf, &'static str)> {
        if representation.is_empty()
            || representation.contains(['/', '\\'])
            || representation.starts_with('.')
        {
            return Err(Error::InvalidInput(format!(
                "bad representation name {:?}",
                representation
            )));
        }

        Ok(match manifold {
            Manifold::Tsne => (self.tsne_dir.join(representation), TSNE_GROUP),
            other => (self.embed_dir.join(representation), other.as_str()),
        })
    }
}

impl CoordinateSource for CachedEmbeddings {
    fn load(&self, representation: &str, manifold: Manifold, keys: &[i64]) -> Result<Vec<[f64; 2]>> {
        let (path, group_name) = self.locate(representation, manifold)?;

        let bytes = std::fs::read(&path)
            .map_err(|e| Error::MissingData(format!("embedding file {}: {}", path.display(), e)))?;
        let mut groups: HashMap<String, HashMap<String, [f64; 2]>> = serde_json::from_slice(&bytes)
            .map_err(|e| Error::MissingData(format!("embedding file {}: {}", path.display(), e)))?;

        let group = groups.remove(group_name).ok_or_else(|| {
            Error::MissingData(format!(
                "embedding file {} has no group {}",
                path.display(),
                group_name
            ))
        })?;

        let coords = keys
            .iter()
            .map(|key| {
                group.get(&key.to_string()).copied().ok_or_else(|| {
                    Error::MissingData(format!(
                        "embedding {}/{} has no entry {}",
                        path.display(),
                        group_name,
                        key
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Loaded {} {} coordinates from {}",
            coords.len(),
            manifold.as_str(),
            path.display()
        );
        Ok(coords)
    }
}

/// Representation files available in the t-SNE cache folder, sorted
///
/// A missing folder yields an empty list.
pub fn list_representations(tsne_dir: &Path) -> Result<Vec<String>> {
    let entries = match std::fs::read_dir(tsne_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".json") {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
