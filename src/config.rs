//! Configuration types
//!
//! Writer, reader and server settings. Everything is passed explicitly into
//! the entry points; [`AppConfig::shared_default`] exists for convenience
//! callers that do not carry their own configuration.
//!
//! # Example
//!
//! ```yaml
//! writer:
//!   item_threshold: 500
//!   byte_threshold: 65536
//!   pagination_placement: leading
//! reader:
//!   max_buffered_items: 1000
//! server:
//!   port: 8080
//! ```

use crate::error::{Error, Result, ResultExt};
use crate::pagination::PaginationStrategy;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

static DEFAULT_CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::default);

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete configuration loaded from YAML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Envelope writer settings
    pub writer: WriterConfig,

    /// Envelope reader settings
    pub reader: ReaderConfig,

    /// HTTP server settings
    pub server: ServerConfig,
}

impl AppConfig {
    /// Process-wide default configuration
    pub fn shared_default() -> &'static AppConfig {
        &DEFAULT_CONFIG
    }

    /// Load and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate a YAML configuration
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section
    pub fn validate(&self) -> Result<()> {
        self.writer.validate()?;
        self.reader.validate()?;
        self.server.validate()
    }
}

// ============================================================================
// Writer Config
// ============================================================================

/// Where the `pagination` property is written relative to `items`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationPlacement {
    /// Resolve pagination first and write it before the items
    #[default]
    Leading,
    /// Write the items first, then resolve and write pagination, so
    /// progress-derived totals are exact
    Trailing,
}

/// Settings for the streaming envelope writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Flush after this many buffered items
    pub item_threshold: usize,

    /// Flush once this many bytes are buffered
    pub byte_threshold: usize,

    /// Initial capacity of the batch buffer
    pub initial_buffer_capacity: usize,

    /// Placement of the pagination property
    pub pagination_placement: PaginationPlacement,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            item_threshold: 256,
            byte_threshold: 32 * 1024,
            initial_buffer_capacity: 8 * 1024,
            pagination_placement: PaginationPlacement::Leading,
        }
    }
}

impl WriterConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the item-count flush threshold
    #[must_use]
    pub fn with_item_threshold(mut self, items: usize) -> Self {
        self.item_threshold = items;
        self
    }

    /// Set the byte-size flush threshold
    #[must_use]
    pub fn with_byte_threshold(mut self, bytes: usize) -> Self {
        self.byte_threshold = bytes;
        self
    }

    /// Set the pagination placement
    #[must_use]
    pub fn with_placement(mut self, placement: PaginationPlacement) -> Self {
        self.pagination_placement = placement;
        self
    }

    /// Write pagination after the items
    #[must_use]
    pub fn trailing(self) -> Self {
        self.with_placement(PaginationPlacement::Trailing)
    }

    /// Check the thresholds
    pub fn validate(&self) -> Result<()> {
        if self.item_threshold == 0 {
            return Err(Error::invalid_config(
                "writer.item_threshold",
                "must be greater than zero",
            ));
        }
        if self.byte_threshold == 0 {
            return Err(Error::invalid_config(
                "writer.byte_threshold",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Reader Config
// ============================================================================

/// Settings for the lazy envelope reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Read size for stream and pipe sources
    pub read_buffer_size: usize,

    /// Items retained while seeking a pagination property that follows them
    pub max_buffered_items: usize,

    /// Largest single JSON value accepted
    pub max_value_bytes: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: 16 * 1024,
            max_buffered_items: 10_000,
            max_value_bytes: 16 * 1024 * 1024,
        }
    }
}

impl ReaderConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the read size
    #[must_use]
    pub fn with_read_buffer_size(mut self, bytes: usize) -> Self {
        self.read_buffer_size = bytes;
        self
    }

    /// Set the number of items retained while seeking pagination
    #[must_use]
    pub fn with_max_buffered_items(mut self, items: usize) -> Self {
        self.max_buffered_items = items;
        self
    }

    /// Set the largest accepted JSON value
    #[must_use]
    pub fn with_max_value_bytes(mut self, bytes: usize) -> Self {
        self.max_value_bytes = bytes;
        self
    }

    /// Check the buffer sizes
    pub fn validate(&self) -> Result<()> {
        if self.read_buffer_size == 0 {
            return Err(Error::invalid_config(
                "reader.read_buffer_size",
                "must be greater than zero",
            ));
        }
        if self.max_value_bytes == 0 {
            return Err(Error::invalid_config(
                "reader.max_value_bytes",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Server Config
// ============================================================================

/// Settings for the `serve` command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Listen port
    pub port: u16,

    /// Chunks buffered between the envelope writer and the response body
    pub channel_capacity: usize,

    /// Items in the demo catalog
    pub catalog_size: u64,

    /// Page size used when a request does not specify one
    pub default_page_size: u32,

    /// Refresh strategy for the streaming endpoint
    pub stream_strategy: PaginationStrategy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            channel_capacity: 16,
            catalog_size: 1_000,
            default_page_size: 100,
            stream_strategy: PaginationStrategy::per_page(100),
        }
    }
}

impl ServerConfig {
    /// Check the server settings
    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            return Err(Error::invalid_config(
                "server.channel_capacity",
                "must be greater than zero",
            ));
        }
        if self.default_page_size == 0 {
            return Err(Error::invalid_config(
                "server.default_page_size",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}
