//! Dependency resolution
//!
//! Links are feature names, not object identities: a rename between two runs
//! breaks cross-run matching.

use std::collections::BTreeMap;

use ft_session::FeatureHandle;

use crate::error::ExtractResult;
use crate::node::{FeatureNode, walk_forest};
use crate::probe::optional;

/// Name-keyed adjacency map
pub type RelationshipMap = BTreeMap<String, Vec<String>>;

/// Ordered, de-duplicated names of a feature's declared parents
///
/// Parents whose name cannot be read are skipped.
pub fn resolve_dependencies(feature: &dyn FeatureHandle) -> ExtractResult<Vec<String>> {
    let Some(parents) = optional(feature.parents(), "parents")? else {
        return Ok(Vec::new());
    };

    let mut names: Vec<String> = Vec::with_capacity(parents.len());
    for parent in &parents {
        if let Some(name) = optional(parent.name(), "parent name")?
            && !names.contains(&name)
        {
            names.push(name);
        }
    }
    Ok(names)
}

/// Flatten every node's dependencies into one map
///
/// Only nodes with at least one dependency get a key. Sibling scopes may
/// reuse a name; their dependency lists are merged in walk order.
pub fn relationship_map(tree: &[FeatureNode]) -> RelationshipMap {
    let mut map = RelationshipMap::new();
    for node in walk_forest(tree).filter(|n| !n.dependencies.is_empty()) {
        let entry = map.entry(node.name.clone()).or_default();
        for dep in &node.dependencies {
            if !entry.contains(dep) {
                entry.push(dep.clone());
            }
        }
    }
    map
}
