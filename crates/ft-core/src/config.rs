//! Extraction configuration

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::MAX_NESTING_DEPTH;

/// Config-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Options controlling one extraction run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Walk sketch entities, dimensions and relations
    pub include_sketch_detail: bool,
    /// Merge driving parameters into node attributes
    pub include_parameters: bool,
    /// Attach a degrees mirror to angle attributes
    pub angle_degrees: bool,
    /// Read configurations and their suppression states
    pub include_configurations: bool,
    /// Record selections, reference planes, constraints and counts per node
    pub include_references: bool,
    /// Deepest sub-feature level to descend into (top level is 0); never
    /// beyond [`MAX_NESTING_DEPTH`]
    pub max_depth: Option<usize>,
    /// Pretty-print the emitted JSON
    pub pretty_json: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            include_sketch_detail: true,
            include_parameters: true,
            angle_degrees: true,
            include_configurations: true,
            include_references: true,
            max_depth: None,
            pretty_json: true,
        }
    }
}

impl ExtractConfig {
    /// Parse from RON text
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Load from `path` if it exists, otherwise use defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            tracing::info!("Loading extraction config from {}", path.display());
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save as pretty RON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// Whether a node at `level` may descend into its sub-features
    pub fn may_descend(&self, level: usize) -> bool {
        let limit = self
            .max_depth
            .map_or(MAX_NESTING_DEPTH, |max| max.min(MAX_NESTING_DEPTH));
        level < limit
    }

    /// Whether the fixed nesting cap, and not `max_depth`, stops descent at `level`
    pub fn capped_at(&self, level: usize) -> bool {
        level >= MAX_NESTING_DEPTH && self.max_depth.is_none_or(|max| level < max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = ExtractConfig::from_ron_str("(max_depth: Some(1), angle_degrees: false)").unwrap();
        assert_eq!(config.max_depth, Some(1));
        assert!(!config.angle_degrees);
        assert!(config.include_sketch_detail);
        assert!(config.pretty_json);
    }

    #[test]
    fn test_may_descend() {
        let unbounded = ExtractConfig::default();
        assert!(unbounded.may_descend(MAX_NESTING_DEPTH - 1));
        assert!(!unbounded.may_descend(MAX_NESTING_DEPTH));
        assert!(unbounded.capped_at(MAX_NESTING_DEPTH));
        assert!(!unbounded.capped_at(MAX_NESTING_DEPTH - 1));

        let generous = ExtractConfig {
            max_depth: Some(1000),
            ..Default::default()
        };
        assert!(!generous.may_descend(MAX_NESTING_DEPTH));
        assert!(generous.capped_at(MAX_NESTING_DEPTH));

        let shallow = ExtractConfig {
            max_depth: Some(1),
            ..Default::default()
        };
        assert!(shallow.may_descend(0));
        assert!(!shallow.may_descend(1));
        assert!(!shallow.capped_at(1));
    }

    #[test]
    fn test_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("featree.ron");
        let config = ExtractConfig {
            include_parameters: false,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ExtractConfig::load(&path).unwrap(), config);
        assert_eq!(
            ExtractConfig::load_or_default(dir.path().join("missing.ron")).unwrap(),
            ExtractConfig::default()
        );
    }

    #[test]
    fn test_bad_ron() {
        assert!(matches!(
            ExtractConfig::from_ron_str("(max_depth: \"deep\")"),
            Err(ConfigError::Parse(_))
        ));
    }
}
