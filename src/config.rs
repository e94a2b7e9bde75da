//! Configuration for font creation.

use crate::fonts::EmbeddingStrategy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable consulted when no CMap resource directory is configured.
pub const CMAP_DIR_ENV: &str = "FONT_OXIDE_CMAP_DIR";

/// Font engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Directory holding predefined CMap resources, one file per CMap name.
    pub cmap_resource_dir: Option<PathBuf>,

    /// Strategy used when the caller does not pass one.
    pub default_strategy: EmbeddingStrategy,

    /// Initial subset flag of created fonts.
    pub subset: bool,

    /// Default glyph width of composite fonts (`/DW`).
    pub default_width: i32,

    /// Mappings per `bfrange` block of generated ToUnicode streams.
    pub max_bfrange_entries: usize,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FontConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            cmap_resource_dir: None,
            default_strategy: EmbeddingStrategy::PreferEmbedded,
            subset: true,
            default_width: 1000,
            max_bfrange_entries: 100,
        }
    }

    /// Set the CMap resource directory.
    pub fn with_cmap_resource_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cmap_resource_dir = Some(dir.into());
        self
    }

    /// Set the default embedding strategy.
    pub fn with_default_strategy(mut self, strategy: EmbeddingStrategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    /// Enable or disable subsetting of new fonts.
    pub fn with_subset(mut self, subset: bool) -> Self {
        self.subset = subset;
        self
    }

    /// Set the composite-font default width.
    pub fn with_default_width(mut self, width: i32) -> Self {
        self.default_width = width;
        self
    }

    /// Set the ToUnicode block size (at least 1).
    pub fn with_max_bfrange_entries(mut self, entries: usize) -> Self {
        self.max_bfrange_entries = entries.max(1);
        self
    }

    /// CMap directory to use: the configured one, else `$FONT_OXIDE_CMAP_DIR`.
    pub fn resolved_cmap_dir(&self) -> Option<PathBuf> {
        self.cmap_resource_dir
            .clone()
            .or_else(|| std::env::var_os(CMAP_DIR_ENV).map(PathBuf::from))
    }
}
