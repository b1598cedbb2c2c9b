//! Engine Configuration

use std::path::Path;

use kbhint_css::Color;
use serde::{Deserialize, Serialize};

/// Selectors whose appearance in a mutation batch warrants a re-apply
pub const DEFAULT_RELEVANCE_SELECTOR: &str = "span[data-icon=\"search-refreshed\"], header, \
     div[contenteditable=\"true\"][aria-label*=\"Search\"], \
     div[role=\"textbox\"][contenteditable=\"true\"]";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Engine tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Minimum time between two apply passes
    pub min_apply_interval_ms: u64,
    /// One-shot re-apply requests after boot, to catch late-rendered UI.
    /// These go through the throttle, and the startup pass counts as the
    /// last apply, so any delay below `min_apply_interval_ms` runs at
    /// `min_apply_interval_ms` (250 runs at 300 with the defaults).
    pub bootstrap_delays_ms: Vec<u64>,
    /// Animation frame period
    pub frame_interval_ms: u64,
    /// Elements inspected (self included) when resolving a background
    pub background_search_depth: usize,
    /// Vertical gap between anchor and overlay
    pub overlay_gap_px: f64,
    /// Horizontal inset for left/right aligned overlays
    pub edge_inset_px: f64,
    /// Inset from the right edge for fixed inline-end hints
    pub inline_end_inset_px: f64,
    /// Default relevance allow-list for the mutation watcher
    pub relevance_selector: String,
    /// Background assumed when nothing is painted and dark mode is preferred
    pub prefer_dark_fallback: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_apply_interval_ms: 300,
            bootstrap_delays_ms: vec![250, 750, 1500],
            frame_interval_ms: 16,
            background_search_depth: 6,
            overlay_gap_px: 4.0,
            edge_inset_px: 8.0,
            inline_end_inset_px: 12.0,
            relevance_selector: DEFAULT_RELEVANCE_SELECTOR.to_string(),
            prefer_dark_fallback: "rgb(24,24,24)".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file; an empty file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::from_json(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid("frame_interval_ms must be positive".into()));
        }
        if self.background_search_depth == 0 {
            return Err(ConfigError::Invalid("background_search_depth must be positive".into()));
        }
        if let Err(e) = Color::parse(&self.prefer_dark_fallback) {
            return Err(ConfigError::Invalid(format!("prefer_dark_fallback: {}", e)));
        }
        Ok(())
    }
}
