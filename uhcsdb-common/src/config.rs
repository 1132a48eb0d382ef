//! Settings loading and path resolution
//!
//! Settings come from three places, highest priority first:
//! 1. Command-line arguments (applied by each binary on top of the loaded value)
//! 2. TOML file named by the `UHCSDB_SETTINGS` environment variable
//! 3. Compiled defaults
//!
//! A missing settings file is never fatal: the services log a warning and
//! start with defaults. A settings file that exists but does not parse is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the TOML settings file
pub const SETTINGS_ENV_VAR: &str = "UHCSDB_SETTINGS";

/// Curated entries shown on `/favorites/`
pub const DEFAULT_FAVORITES: [i64; 20] = [
    73, 357, 137, 156, 223, 290, 354, 359, 363, 372, 379, 394, 404, 422, 450, 452, 472, 696, 785,
    830,
];

/// File extensions accepted for micrograph images and staged documents
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 6] = ["pdf", "png", "jpg", "jpeg", "gif", "tif"];

/// Service settings shared by the catalog and the explorer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of all on-disk data (database, static images, cached projections)
    pub data_dir: PathBuf,

    /// SQLite metadata store, relative to `data_dir` unless absolute
    pub database: PathBuf,

    /// Micrograph image folder, relative to `data_dir`
    pub micrograph_path: PathBuf,

    /// Upload destination for new micrographs, relative to `data_dir`
    pub upload_folder: PathBuf,

    /// Extraction staging folder as seen by the web pages
    pub extract_path: PathBuf,

    /// Extraction staging folder on disk, relative to `data_dir`
    pub pdf_stage: PathBuf,

    /// Lowercase file extensions (without dot) accepted for images/uploads
    pub allowed_extensions: BTreeSet<String>,

    /// Micrograph ids listed on the favorites page
    pub favorites: Vec<i64>,

    /// Entries per listing page
    pub per_page: usize,

    /// Number of neighbors returned by the visual query
    pub neighbors: usize,

    /// Precomputed feature vectors for the visual query, relative to `data_dir`
    pub features_file: PathBuf,

    /// Catalog service settings
    pub catalog: CatalogSettings,

    /// Explorer service settings
    pub explorer: ExplorerSettings,
}

/// Catalog service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Listen address
    pub bind: String,
}

/// Explorer service settings, read by both processes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerSettings {
    /// Listen address of the explorer process
    pub bind: String,

    /// Base URL the browser (and the catalog) use to reach the explorer
    pub public_url: String,

    /// Whether the catalog starts and stops the explorer process itself
    pub managed: bool,

    /// Explorer executable launched when `managed` is set
    pub binary: PathBuf,

    /// How long the catalog waits for a freshly started explorer to report healthy
    pub startup_timeout_ms: u64,

    /// Upper bound on any single catalog → explorer request
    pub request_timeout_ms: u64,

    /// Idle sessions are dropped after this many seconds
    pub session_ttl_secs: u64,

    /// Origin allowed to load explorer sessions cross-origin (the catalog's public origin)
    pub allowed_origin: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database: PathBuf::from("microstructures.sqlite"),
            micrograph_path: PathBuf::from("static/micrographs"),
            upload_folder: PathBuf::from("uhcsdb/static/micrographs"),
            extract_path: PathBuf::from("static/pdf_stage"),
            pdf_stage: PathBuf::from("uhcsdb/static/pdf_stage"),
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            favorites: DEFAULT_FAVORITES.to_vec(),
            per_page: 24,
            neighbors: 12,
            features_file: PathBuf::from("features/vgg16_block5_conv3-vlad-32.json"),
            catalog: CatalogSettings::default(),
            explorer: ExplorerSettings::default(),
        }
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5006".to_string(),
            public_url: "http://localhost:5006".to_string(),
            managed: true,
            binary: PathBuf::from("uhcsdb-explorer"),
            startup_timeout_ms: 10_000,
            request_timeout_ms: 5_000,
            session_ttl_secs: 3_600,
            allowed_origin: "http://localhost:5000".to_string(),
        }
    }
}

/// OS-dependent default data folder
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("uhcsdb"))
        .unwrap_or_else(|| PathBuf::from("./uhcsdb_data"))
}

impl Settings {
    /// Load settings from the file named by `UHCSDB_SETTINGS`, or defaults
    pub fn load() -> Result<Self> {
        match std::env::var(SETTINGS_ENV_VAR) {
            Ok(path) if !path.is_empty() => Self::load_from(Path::new(&path)),
            _ => {
                info!("{} not set, using default settings", SETTINGS_ENV_VAR);
                Ok(Self::default())
            }
        }
    }

    /// Load settings from a TOML file
    ///
    /// Keys absent from the file keep their defaults. A missing file logs a
    /// warning and yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Settings file {} not found, using defaults",
                    path.display()
                );
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let settings: Settings = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        info!("Loaded settings from {}", path.display());
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values no service can run with
    pub fn validate(&self) -> Result<()> {
        if self.per_page == 0 {
            return Err(Error::Config("per_page must be at least 1".to_string()));
        }
        if self.neighbors == 0 {
            return Err(Error::Config("neighbors must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Resolve a configured path against `data_dir`
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.resolve(&self.database)
    }

    /// Folder served under `/static`
    pub fn static_dir(&self) -> PathBuf {
        self.data_dir.join("static")
    }

    /// Cached t-SNE projections, one file per representation
    pub fn tsne_dir(&self) -> PathBuf {
        self.static_dir().join("tsne")
    }

    /// Cached projections for every other manifold method
    pub fn embed_dir(&self) -> PathBuf {
        self.static_dir().join("embed")
    }

    pub fn features_path(&self) -> PathBuf {
        self.resolve(&self.features_file)
    }

    /// Whether a file name carries one of the allowed extensions
    ///
    /// The comparison is case-insensitive and only the final extension counts.
    pub fn allowed_file(&self, filename: &str) -> bool {
        match filename.rsplit_once('.') {
            Some((_, ext)) => self.allowed_extensions.contains(&ext.to_lowercase()),
            None => false,
        }
    }
}
