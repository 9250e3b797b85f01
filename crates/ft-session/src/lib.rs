//! CAD Session Abstraction
//!
//! This crate provides:
//! - Read-only traits over a live CAD session (documents, features, sketches)
//! - A fallible accessor model that separates unsupported members from faults
//! - An in-memory session that replays recorded document snapshots

pub mod memory;
pub mod traits;

// Re-exports for convenience
pub use memory::{
    MemoryApplication, MemoryConfiguration, MemoryDocument, MemoryFeature, MemoryRecord,
    MemorySession, MemorySketch, Members, SnapshotError, members,
};
pub use traits::{
    AccessError, AccessResult, CadApplication, CadSession, ConfigurationHandle, DocumentKind,
    FeatureHandle, FeatureRef, PropertyBag, PropertyValue, SketchHandle,
};
