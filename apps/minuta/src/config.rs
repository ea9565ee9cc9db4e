//! # Configuration
//!
//! `minuta.toml` loading. Every key is optional; command-line flags win over
//! file values.
//!
//! ```toml
//! catalog = "catalog.json"
//! database = "minuta.db"
//! backend = "redb"
//!
//! [analysis]
//! default_net_weight_g = 100.0
//!
//! [thresholds]
//! optimo_max = 35.0
//! aceptable_max = 70.0
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! ```

use clap::ValueEnum;
use minuta_core::{
    AdequacyThresholds, AnalysisOptions, CatalogDocument, Engine, MemoryCatalog, MinutaError,
    primitives::DEFAULT_NET_WEIGHT_G,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Maximum catalog file size (64 MB).
const MAX_CATALOG_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Maximum configuration file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Default request body limit for the API (2 MB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

// =============================================================================
// BACKEND
// =============================================================================

/// Where saved overrides live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Volatile, lost on exit.
    Memory,
    /// redb database file.
    #[default]
    Redb,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Redb => f.write_str("redb"),
        }
    }
}

// =============================================================================
// SECTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisSection {
    pub default_net_weight_g: f64,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            default_net_weight_g: DEFAULT_NET_WEIGHT_G,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    pub body_limit_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            body_limit_bytes: DEFAULT_BODY_LIMIT,
        }
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Resolved application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MinutaConfig {
    /// Catalog JSON document.
    pub catalog: PathBuf,
    /// redb override database.
    pub database: PathBuf,
    pub backend: Backend,
    pub analysis: AnalysisSection,
    pub thresholds: AdequacyThresholds,
    pub server: ServerSection,
}

impl Default for MinutaConfig {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("catalog.json"),
            database: PathBuf::from("minuta.db"),
            backend: Backend::default(),
            analysis: AnalysisSection::default(),
            thresholds: AdequacyThresholds::default(),
            server: ServerSection::default(),
        }
    }
}

impl MinutaConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, MinutaError> {
        toml::from_str(text).map_err(|e| MinutaError::ConfigError(e.to_string()))
    }

    /// Load from a file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, MinutaError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let bytes = read_bounded(path, MAX_CONFIG_FILE_SIZE)?;
        let text = String::from_utf8(bytes).map_err(|e| {
            MinutaError::ConfigError(format!("{} is not UTF-8: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Apply command-line overrides.
    #[must_use]
    pub fn with_overrides(
        mut self,
        catalog: Option<PathBuf>,
        database: Option<PathBuf>,
        backend: Option<Backend>,
    ) -> Self {
        if let Some(catalog) = catalog {
            self.catalog = catalog;
        }
        if let Some(database) = database {
            self.database = database;
        }
        if let Some(backend) = backend {
            self.backend = backend;
        }
        self
    }

    #[must_use]
    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            default_net_weight: self.analysis.default_net_weight_g,
            thresholds: self.thresholds,
        }
    }

    /// Load the catalog and open the configured override backend.
    pub fn open_engine(&self) -> Result<Engine, MinutaError> {
        let catalog = load_catalog(&self.catalog)?;
        let engine = match self.backend {
            Backend::Memory => Engine::new(catalog),
            Backend::Redb => Engine::with_redb(catalog, &self.database)?,
        };
        tracing::info!(
            catalog = %self.catalog.display(),
            backend = %self.backend,
            "engine ready"
        );
        engine.with_options(self.analysis_options())
    }
}

// =============================================================================
// FILE LOADING
// =============================================================================

/// Read and validate a catalog JSON document.
pub fn load_catalog(path: &Path) -> Result<MemoryCatalog, MinutaError> {
    let bytes = read_bounded(path, MAX_CATALOG_FILE_SIZE)?;
    let doc: CatalogDocument = serde_json::from_slice(&bytes).map_err(|e| {
        MinutaError::SerializationError(format!("catalog {}: {}", path.display(), e))
    })?;
    MemoryCatalog::from_document(doc)
}

/// Read a regular file, refusing anything larger than `max_size`.
pub fn read_bounded(path: &Path, max_size: u64) -> Result<Vec<u8>, MinutaError> {
    let canonical = path.canonicalize().map_err(|e| {
        MinutaError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;
    if !canonical.is_file() {
        return Err(MinutaError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    let metadata = std::fs::metadata(&canonical)
        .map_err(|e| MinutaError::IoError(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > max_size {
        return Err(MinutaError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }

    std::fs::read(&canonical)
        .map_err(|e| MinutaError::IoError(format!("Read {}: {}", path.display(), e)))
}
