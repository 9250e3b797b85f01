//! Shared constants

/// Version string stamped into every extraction's metadata
pub const EXTRACTOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "featree.ron";

/// Suffix appended to the sanitized document title for the output file
pub const OUTPUT_SUFFIX: &str = "_feature_tree.json";

/// Separator between hierarchy path segments
pub const PATH_SEPARATOR: char = '.';

/// Deepest sub-feature level the walker descends into, whatever the config
/// says. Keeps the emitted JSON well inside the nesting depth JSON readers
/// accept (128 for serde_json).
pub const MAX_NESTING_DEPTH: usize = 48;
