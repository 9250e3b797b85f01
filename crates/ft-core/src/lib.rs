//! Feature-Tree Extraction
//!
//! This crate provides:
//! - Classification of vendor feature types into semantic categories
//! - Per-category attribute extraction with per-member fault isolation
//! - Sketch, reference, dependency and document-level extraction
//! - A stack-based tree walker and JSON export of the result

pub mod attributes;
pub mod classify;
pub mod config;
pub mod constants;
pub mod dependency;
pub mod document;
pub mod error;
pub mod export;
pub mod node;
pub mod probe;
pub mod references;
pub mod sketch;
pub mod walker;

// Re-exports for convenience
pub use classify::{FeatureCategory, classify};
pub use config::{ConfigError, ExtractConfig};
pub use dependency::{RelationshipMap, relationship_map, resolve_dependencies};
pub use document::{ExtractionDocument, ExtractionMetadata, Statistics, extract_document};
pub use error::{ExtractError, ExtractResult};
pub use export::{ExportError, default_output_file_name};
pub use node::{Attribute, AttributeUnit, AttributeValue, FeatureNode, NodeError};
pub use references::{FeatureReferences, extract_references};
pub use sketch::SketchDetail;
pub use walker::{TreeWalker, hierarchy_path};
