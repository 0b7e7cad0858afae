//! Configuration for the screen analyzer.
//!
//! Loads configuration from TOML files and provides runtime defaults. The
//! tab-strip geometry lives here because the pixel offsets are heuristics
//! tuned to common browser chrome at one DPI, not guaranteed contracts.
//! Hosts targeting other browsers or scales are expected to retune them.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub ocr: OcrConfig,

    #[serde(default)]
    pub tree: TreeConfig,

    #[serde(default)]
    pub tabs: TabScanConfig,
}

/// Which recognition engine(s) `detect_text` dispatches to.
///
/// A static choice made at construction time, never content-dependent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineSelection {
    /// Primary engine only.
    Primary,
    /// Fallback engine only.
    Fallback,
    /// Primary first; its non-empty result is authoritative, the fallback is
    /// consulted only when the primary yields nothing.
    Both,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Engine selection for text detection.
    #[serde(default = "default_engine")]
    pub engine: EngineSelection,

    /// Detections below this confidence are dropped by `extract_visible_text`.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum traversal depth for `ui_tree` (root = 0).
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum traversal depth for the tab search.
    #[serde(default = "default_tab_search_depth")]
    pub tab_search_depth: u32,

    /// Hard cap on visited nodes per traversal. Accessibility trees come
    /// from third-party apps and may be cyclic or pathologically wide.
    #[serde(default = "default_max_nodes")]
    pub max_nodes: u32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            tab_search_depth: default_tab_search_depth(),
            max_nodes: default_max_nodes(),
        }
    }
}

/// One horizontal strip of a window image, expressed as insets from the
/// window edges: `x` runs from `left` to `width - right_inset`, `y` from
/// `top` to `bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabStrip {
    pub left: i32,
    pub top: i32,
    pub right_inset: i32,
    pub bottom: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabScanConfig {
    /// Primary tab-bar estimate: skips the window-control area on the left
    /// and the address-bar area on the right of common browser chrome.
    #[serde(default = "default_primary_strip")]
    pub primary_strip: TabStrip,

    /// Looser last-resort strip, scanned only when the primary strip
    /// produced nothing.
    #[serde(default = "default_secondary_strip")]
    pub secondary_strip: TabStrip,

    /// Minimum horizontal distance between accepted candidates; closer hits
    /// are treated as duplicate reads of the same tab.
    #[serde(default = "default_min_spacing")]
    pub min_spacing_px: i32,

    /// Maximum number of tabs returned by the OCR stages.
    #[serde(default = "default_max_tabs")]
    pub max_tabs: usize,

    /// Exact texts never accepted as tab titles.
    #[serde(default = "default_stop_titles")]
    pub stop_titles: Vec<String>,
}

impl Default for TabScanConfig {
    fn default() -> Self {
        Self {
            primary_strip: default_primary_strip(),
            secondary_strip: default_secondary_strip(),
            min_spacing_px: default_min_spacing(),
            max_tabs: default_max_tabs(),
            stop_titles: default_stop_titles(),
        }
    }
}

// Default value functions for serde
fn default_engine() -> EngineSelection {
    EngineSelection::Primary
}

fn default_confidence_threshold() -> f32 {
    0.5
}

fn default_max_depth() -> u32 {
    5
}

fn default_tab_search_depth() -> u32 {
    10
}

fn default_max_nodes() -> u32 {
    10_000
}

fn default_primary_strip() -> TabStrip {
    TabStrip {
        left: 50,
        top: 0,
        right_inset: 200,
        bottom: 40,
    }
}

fn default_secondary_strip() -> TabStrip {
    TabStrip {
        left: 80,
        top: 5,
        right_inset: 150,
        bottom: 35,
    }
}

fn default_min_spacing() -> i32 {
    30
}

fn default_max_tabs() -> usize {
    15
}

fn default_stop_titles() -> Vec<String> {
    vec![
        "×".to_string(),
        "+".to_string(),
        "...".to_string(),
        "New Tab".to_string(),
        "Google".to_string(),
        "Chrome".to_string(),
    ]
}

impl AnalyzerConfig {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Self::default_config_path())
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: PathBuf) -> Self {
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file found at {:?}, using defaults", path);
                Self::default()
            }
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("screen-analyzer")
            .join("config.toml")
    }

    /// Save configuration to a specific path.
    pub fn save_to_path(&self, path: PathBuf) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

        std::fs::write(&path, contents)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.ocr.engine, EngineSelection::Primary);
        assert_eq!(config.ocr.confidence_threshold, 0.5);
        assert_eq!(config.tree.max_depth, 5);
        assert_eq!(config.tree.tab_search_depth, 10);
        assert_eq!(config.tabs.min_spacing_px, 30);
        assert_eq!(config.tabs.max_tabs, 15);
        assert_eq!(config.tabs.primary_strip.left, 50);
        assert_eq!(config.tabs.secondary_strip.top, 5);
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
[ocr]
engine = "both"
confidence_threshold = 0.7

[tree]
max_depth = 8
"#;

        let config: AnalyzerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.ocr.engine, EngineSelection::Both);
        assert_eq!(config.ocr.confidence_threshold, 0.7);
        assert_eq!(config.tree.max_depth, 8);
        // Unspecified sections fall back to defaults.
        assert_eq!(config.tree.tab_search_depth, 10);
        assert_eq!(config.tabs.max_tabs, 15);
    }

    #[test]
    fn test_parse_tab_strip_override() {
        let toml_str = r#"
[tabs]
min_spacing_px = 24
primary_strip = { left = 60, top = 0, right_inset = 240, bottom = 44 }
"#;

        let config: AnalyzerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.tabs.min_spacing_px, 24);
        assert_eq!(config.tabs.primary_strip.right_inset, 240);
        // The secondary strip stays at its default.
        assert_eq!(config.tabs.secondary_strip, default_secondary_strip());
    }

    #[test]
    fn test_stop_titles_default() {
        let config = AnalyzerConfig::default();
        assert!(config.tabs.stop_titles.iter().any(|s| s == "New Tab"));
        assert!(config.tabs.stop_titles.iter().any(|s| s == "×"));
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.toml");

        let mut config = AnalyzerConfig::default();
        config.ocr.engine = EngineSelection::Fallback;
        config.tree.max_nodes = 500;

        config.save_to_path(path.clone()).unwrap();
        let reloaded = AnalyzerConfig::load_from_path(path);

        assert_eq!(reloaded.ocr.engine, EngineSelection::Fallback);
        assert_eq!(reloaded.tree.max_nodes, 500);
    }

    #[test]
    fn test_invalid_toml_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "not valid toml [[[").unwrap();

        let config = AnalyzerConfig::load_from_path(path);
        assert_eq!(config.ocr.engine, EngineSelection::Primary);
    }
}
