//! Feature tree walker
//!
//! Pre-order, depth-first traversal over the top-level feature chain and the
//! nested sub-feature chains. Uses an explicit frame stack, so the walk itself
//! never recurses. Descent stops at [`MAX_NESTING_DEPTH`] levels even when the
//! config allows more: the emitted tree nests two JSON levels per feature
//! level and must stay readable by `serde_json`.

use ft_session::{AccessError, AccessResult, CadSession, FeatureHandle, FeatureRef};
use tracing::{debug, warn};

use crate::attributes::extract_attributes;
use crate::classify::classify;
use crate::config::ExtractConfig;
use crate::constants::{MAX_NESTING_DEPTH, PATH_SEPARATOR};
use crate::dependency::resolve_dependencies;
use crate::error::{ExtractError, ExtractResult};
use crate::node::{FeatureNode, NodeError};
use crate::probe::optional;
use crate::references::extract_references;
use crate::sketch::extract_sketch;

/// Build a hierarchy path from the parent's path and a 1-based position
pub fn hierarchy_path(parent: Option<&str>, position: usize) -> String {
    match parent {
        Some(prefix) => format!("{prefix}{PATH_SEPARATOR}{position}"),
        None => position.to_string(),
    }
}

/// One sibling list being walked
struct Frame {
    /// Next feature to visit in this list
    cursor: Option<FeatureRef>,
    /// Nesting level (top level is 0)
    level: usize,
    /// Node owning this list; `None` for the top level
    owner: Option<FeatureNode>,
    /// Completed nodes of this list
    nodes: Vec<FeatureNode>,
}

impl Frame {
    fn prefix(&self) -> Option<&str> {
        self.owner.as_ref().map(|n| n.hierarchy_path.as_str())
    }
}

/// Walks a session's feature graph into normalized nodes
pub struct TreeWalker<'a> {
    config: &'a ExtractConfig,
}

impl<'a> TreeWalker<'a> {
    pub fn new(config: &'a ExtractConfig) -> Self {
        Self { config }
    }

    /// Walk the whole tree
    ///
    /// Returns the top-level nodes in native order. Only a lost session is
    /// an error; everything else degrades into the output.
    pub fn walk(&self, session: &dyn CadSession) -> ExtractResult<Vec<FeatureNode>> {
        let first = optional(session.first_feature(), "first feature")?.flatten();
        let mut stack = vec![Frame {
            cursor: first,
            level: 0,
            owner: None,
            nodes: Vec::new(),
        }];

        loop {
            let Some(frame) = stack.last_mut() else {
                return Ok(Vec::new());
            };

            let Some(feature) = frame.cursor.take() else {
                // sibling list exhausted: attach it to its owner
                let Some(done) = stack.pop() else {
                    return Ok(Vec::new());
                };
                match (done.owner, stack.last_mut()) {
                    (Some(mut owner), Some(parent)) => {
                        owner.children = done.nodes;
                        parent.nodes.push(owner);
                    }
                    _ => return Ok(done.nodes),
                }
                continue;
            };

            let level = frame.level;
            let order = frame.nodes.len();
            let path = hierarchy_path(frame.prefix(), order + 1);
            let node = self.visit(feature.as_ref(), level, order, path)?;

            let next = if level == 0 {
                feature.next_feature()
            } else {
                feature.next_sub_feature()
            };
            frame.cursor = advance(next, &node)?;

            let children = if self.config.may_descend(level) {
                advance(feature.first_sub_feature(), &node)?
            } else {
                if self.config.capped_at(level)
                    && advance(feature.first_sub_feature(), &node)?.is_some()
                {
                    warn!(
                        "Sub-features of {} ({}) lie below the nesting limit of {} levels; skipped",
                        node.hierarchy_path, node.name, MAX_NESTING_DEPTH
                    );
                }
                None
            };

            match children {
                Some(head) => stack.push(Frame {
                    cursor: Some(head),
                    level: level + 1,
                    owner: Some(node),
                    nodes: Vec::new(),
                }),
                None => frame.nodes.push(node),
            }
        }
    }

    /// Build one node (children are attached later)
    fn visit(
        &self,
        feature: &dyn FeatureHandle,
        level: usize,
        order: usize,
        path: String,
    ) -> ExtractResult<FeatureNode> {
        let name = identity(feature.name())?;
        let type_raw = identity(feature.raw_type_name())?;

        let (name, type_raw) = match (name, type_raw) {
            (Ok(name), Ok(type_raw)) => (name, type_raw),
            (Err(error), type_raw) => {
                return self.faulted(feature, None, type_raw.ok(), error, order, path);
            }
            (Ok(name), Err(error)) => {
                return self.faulted(feature, Some(name), None, error, order, path);
            }
        };

        let category = classify(&type_raw);
        debug!("Visiting {} {} ({}, level {})", path, name, category, level);

        let suppressed = optional(feature.is_suppressed(), "suppression state")?.unwrap_or(false);
        let attributes = extract_attributes(feature, category, self.config)?;
        let dependencies = resolve_dependencies(feature)?;
        let sketch_detail = if self.config.include_sketch_detail {
            extract_sketch(feature)?
        } else {
            None
        };
        let references = if self.config.include_references {
            extract_references(feature, category)?
        } else {
            None
        };

        Ok(FeatureNode {
            name,
            type_raw,
            category,
            creation_order: order,
            hierarchy_path: path,
            suppressed,
            attributes,
            dependencies,
            sketch_detail,
            references,
            children: Vec::new(),
            error: None,
        })
    }

    /// Node for a feature whose identity could not be read
    fn faulted(
        &self,
        feature: &dyn FeatureHandle,
        name: Option<String>,
        type_raw: Option<String>,
        error: NodeError,
        order: usize,
        path: String,
    ) -> ExtractResult<FeatureNode> {
        warn!(
            "Feature at {} could not be identified ({}: {}); recording error marker",
            path, error.member, error.message
        );
        let type_raw = type_raw.unwrap_or_default();
        Ok(FeatureNode {
            name: name.unwrap_or_default(),
            category: classify(&type_raw),
            type_raw,
            creation_order: order,
            hierarchy_path: path,
            suppressed: optional(feature.is_suppressed(), "suppression state")?.unwrap_or(false),
            attributes: Default::default(),
            dependencies: Vec::new(),
            sketch_detail: None,
            references: None,
            children: Vec::new(),
            error: Some(error),
        })
    }
}

/// Classify an identity read: a lost session is fatal, any other fault
/// becomes the node's error marker
fn identity(result: AccessResult<String>) -> ExtractResult<Result<String, NodeError>> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(AccessError::Disconnected(message)) => Err(ExtractError::Connection(message)),
        Err(AccessError::Unsupported(member)) => Ok(Err(NodeError {
            member,
            message: "not supported".into(),
        })),
        Err(AccessError::Failed { member, message }) => Ok(Err(NodeError { member, message })),
    }
}

/// Follow a navigation link; a faulting link ends the chain with a warning
fn advance(
    result: AccessResult<Option<FeatureRef>>,
    from: &FeatureNode,
) -> ExtractResult<Option<FeatureRef>> {
    match result {
        Ok(next) => Ok(next),
        Err(AccessError::Disconnected(message)) => Err(ExtractError::Connection(message)),
        Err(e) => {
            warn!("Cannot advance past {} ({}): {}", from.hierarchy_path, from.name, e);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::FeatureCategory;
    use crate::node::walk_forest;
    use ft_session::{MemoryDocument, MemoryFeature, MemorySession, PropertyValue};

    fn walk(doc: MemoryDocument, config: &ExtractConfig) -> ExtractResult<Vec<FeatureNode>> {
        TreeWalker::new(config).walk(&MemorySession::new(doc))
    }

    fn nested_doc() -> MemoryDocument {
        MemoryDocument::new("Part1", ft_session::DocumentKind::Part)
            .with_feature(MemoryFeature::new("Front Plane", "RefPlane"))
            .with_feature(
                MemoryFeature::new("Boss-Extrude1", "BossExtrude")
                    .with("Depth", PropertyValue::Float(0.01))
                    .with_sub_feature(
                        MemoryFeature::new("Sketch1", "ProfileFeature")
                            .with_parents(["Front Plane"])
                            .with_sub_feature(MemoryFeature::new("Point1", "RefPoint")),
                    )
                    .with_sub_feature(MemoryFeature::new("Sketch2", "ProfileFeature")),
            )
            .with_feature(MemoryFeature::new("Fillet1", "Fillet").with_parents(["Boss-Extrude1"]))
    }

    #[test]
    fn test_hierarchy_path() {
        assert_eq!(hierarchy_path(None, 3), "3");
        assert_eq!(hierarchy_path(Some("3"), 1), "3.1");
        assert_eq!(hierarchy_path(Some("3.1"), 2), "3.1.2");
    }

    #[test]
    fn test_walk_order_and_paths() {
        let tree = walk(nested_doc(), &ExtractConfig::default()).unwrap();

        assert_eq!(tree.len(), 3);
        let orders: Vec<_> = tree.iter().map(|n| n.creation_order).collect();
        assert_eq!(orders, vec![0, 1, 2]);

        let boss = &tree[1];
        assert_eq!(boss.category, FeatureCategory::Extrude);
        assert_eq!(boss.children.len(), 2);
        assert_eq!(boss.children[0].hierarchy_path, "2.1");
        assert_eq!(boss.children[1].creation_order, 1);
        assert_eq!(boss.children[0].children[0].hierarchy_path, "2.1.1");

        let paths: Vec<_> = walk_forest(&tree).map(|n| n.hierarchy_path.as_str()).collect();
        assert_eq!(paths, vec!["1", "2", "2.1", "2.1.1", "2.2", "3"]);
        assert_eq!(tree[2].dependencies, vec!["Boss-Extrude1"]);
    }

    #[test]
    fn test_references_follow_config() {
        let tree = walk(nested_doc(), &ExtractConfig::default()).unwrap();
        // Front Plane is named as a parent by Sketch1, Boss-Extrude1 by Fillet1
        assert_eq!(tree[0].references.as_ref().unwrap().children_count, Some(1));
        assert_eq!(tree[1].references.as_ref().unwrap().children_count, Some(1));
        assert!(tree[2].references.is_none());

        let config = ExtractConfig {
            include_references: false,
            ..Default::default()
        };
        let tree = walk(nested_doc(), &config).unwrap();
        assert!(walk_forest(&tree).all(|n| n.references.is_none()));
    }

    #[test]
    fn test_max_depth() {
        let config = ExtractConfig {
            max_depth: Some(1),
            ..Default::default()
        };
        let tree = walk(nested_doc(), &config).unwrap();
        assert_eq!(tree[1].children.len(), 2);
        assert!(tree[1].children[0].children.is_empty());

        let flat = ExtractConfig {
            max_depth: Some(0),
            ..Default::default()
        };
        let tree = walk(nested_doc(), &flat).unwrap();
        assert!(tree.iter().all(|n| n.children.is_empty()));
    }

    /// A single chain of `depth` features, each the only sub-feature of the previous one
    fn deep_chain(depth: usize) -> MemoryDocument {
        let mut feature = MemoryFeature::new(format!("Nested{depth}"), "ProfileFeature");
        for i in (1..depth).rev() {
            feature = MemoryFeature::new(format!("Nested{i}"), "ProfileFeature").with_sub_feature(feature);
        }
        MemoryDocument::default().with_feature(feature)
    }

    #[test]
    fn test_nesting_cap() {
        let tree = walk(deep_chain(80), &ExtractConfig::default()).unwrap();
        assert_eq!(walk_forest(&tree).count(), MAX_NESTING_DEPTH + 1);

        let deepest = walk_forest(&tree).last().unwrap();
        assert!(deepest.children.is_empty());
        assert_eq!(deepest.name, format!("Nested{}", MAX_NESTING_DEPTH + 1));
        assert_eq!(deepest.hierarchy_path.split(PATH_SEPARATOR).count(), MAX_NESTING_DEPTH + 1);

        // a larger max_depth does not lift the cap
        let config = ExtractConfig {
            max_depth: Some(500),
            ..Default::default()
        };
        let tree = walk(deep_chain(80), &config).unwrap();
        assert_eq!(walk_forest(&tree).count(), MAX_NESTING_DEPTH + 1);

        // shallower chains are untouched
        let tree = walk(deep_chain(20), &ExtractConfig::default()).unwrap();
        assert_eq!(walk_forest(&tree).count(), 20);
    }

    #[test]
    fn test_fault_injection_keeps_every_entry() {
        let mut doc = MemoryDocument::new("Faulty", ft_session::DocumentKind::Part);
        for i in 1..=10 {
            let mut feature = MemoryFeature::new(format!("Feature{i}"), "Fillet")
                .with("Radius", PropertyValue::Float(0.001 * i as f64));
            if i == 3 {
                feature = feature.corrupt();
            }
            doc = doc.with_feature(feature);
        }
        let tree = walk(doc, &ExtractConfig::default()).unwrap();

        assert_eq!(tree.len(), 10);
        let failed: Vec<_> = tree.iter().filter(|n| n.is_failed()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].creation_order, 2);
        assert_eq!(failed[0].hierarchy_path, "3");
        assert!(failed[0].attributes.is_empty());
        assert_eq!(tree[3].name, "Feature4");
        assert!(tree[3].attributes.contains_key("radius"));
    }

    #[test]
    fn test_type_fault_keeps_name() {
        let doc = MemoryDocument::default()
            .with_feature(MemoryFeature::new("Odd", "Fillet").failing("TypeName"));
        let tree = walk(doc, &ExtractConfig::default()).unwrap();
        assert_eq!(tree[0].name, "Odd");
        assert_eq!(tree[0].category, FeatureCategory::Generic);
        assert_eq!(tree[0].error.as_ref().unwrap().member, "TypeName");
    }

    #[test]
    fn test_broken_sibling_link_ends_list() {
        let doc = MemoryDocument::default()
            .with_feature(MemoryFeature::new("A", "Fillet").failing("GetNextFeature"))
            .with_feature(MemoryFeature::new("B", "Fillet"));
        let tree = walk(doc, &ExtractConfig::default()).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "A");
    }

    #[test]
    fn test_disconnect_is_fatal() {
        let mut lost = MemoryFeature::new("B", "Fillet");
        lost.disconnect = true;
        let doc = MemoryDocument::default()
            .with_feature(MemoryFeature::new("A", "Fillet"))
            .with_feature(lost);
        assert!(matches!(
            walk(doc, &ExtractConfig::default()),
            Err(ExtractError::Connection(_))
        ));
    }

    #[test]
    fn test_empty_tree() {
        let tree = walk(MemoryDocument::default(), &ExtractConfig::default()).unwrap();
        assert!(tree.is_empty());
    }
}
