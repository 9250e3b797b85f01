//! JSON export of extraction documents

use std::path::{Path, PathBuf};

use crate::constants::OUTPUT_SUFFIX;
use crate::document::ExtractionDocument;

/// Export-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

/// Serialize a document to JSON
pub fn to_json(document: &ExtractionDocument, pretty: bool) -> Result<String, ExportError> {
    let result = if pretty {
        serde_json::to_string_pretty(document)
    } else {
        serde_json::to_string(document)
    };
    result.map_err(|e| ExportError::Serialize(e.to_string()))
}

/// Parse a document from JSON
pub fn from_json(content: &str) -> Result<ExtractionDocument, ExportError> {
    serde_json::from_str(content).map_err(|e| ExportError::Deserialize(e.to_string()))
}

/// Write a document to a JSON file
pub fn save(
    document: &ExtractionDocument,
    path: impl AsRef<Path>,
    pretty: bool,
) -> Result<(), ExportError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ExportError::Io(e.to_string()))?;
    }
    let content = to_json(document, pretty)?;
    std::fs::write(path, content).map_err(|e| ExportError::Io(e.to_string()))?;
    tracing::info!("Wrote feature tree to {}", path.display());
    Ok(())
}

/// Read a document from a JSON file
pub fn load(path: impl AsRef<Path>) -> Result<ExtractionDocument, ExportError> {
    let content =
        std::fs::read_to_string(path.as_ref()).map_err(|e| ExportError::Io(e.to_string()))?;
    from_json(&content)
}

/// Default output file name for a document title
///
/// `"Bracket.SLDPRT"` becomes `"Bracket_SLDPRT_feature_tree.json"`.
pub fn default_output_file_name(title: &str) -> String {
    let stem = if title.is_empty() { "document" } else { title };
    format!("{}{}", stem.replace('.', "_"), OUTPUT_SUFFIX)
}

/// Default output path next to `dir`
pub fn default_output_path(dir: impl AsRef<Path>, title: &str) -> PathBuf {
    dir.as_ref().join(default_output_file_name(title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::FeatureCategory;
    use crate::config::ExtractConfig;
    use crate::document::extract_document;
    use crate::node::walk_forest;
    use ft_session::{DocumentKind, MemoryDocument, MemoryFeature, MemorySession, PropertyValue};

    fn sample() -> ExtractionDocument {
        let doc = MemoryDocument::new("Plate.SLDPRT", DocumentKind::Part)
            .with_feature(MemoryFeature::new("Top Plane", "RefPlane"))
            .with_feature(
                MemoryFeature::new("Boss-Extrude1", "BossExtrude")
                    .with("Depth", PropertyValue::Float(0.1 + 0.2))
                    .with("DraftAngle", PropertyValue::Float(0.123456789012345))
                    .with_parents(["Top Plane"])
                    .with_sub_feature(
                        MemoryFeature::new("Sketch1", "ProfileFeature").with_parents(["Top Plane"]),
                    ),
            )
            .with_feature(MemoryFeature::new("Weird", "Fillet").corrupt());
        extract_document(&MemorySession::new(doc), &ExtractConfig::default()).unwrap()
    }

    #[test]
    fn test_json_round_trip() {
        let original = sample();
        let json = to_json(&original, true).unwrap();
        let parsed = from_json(&json).unwrap();

        let before: Vec<_> = walk_forest(&original.feature_tree).collect();
        let after: Vec<_> = walk_forest(&parsed.feature_tree).collect();
        assert_eq!(before.len(), after.len());
        for (a, b) in before.iter().zip(&after) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.category, b.category);
            assert_eq!(a.creation_order, b.creation_order);
            assert_eq!(a.hierarchy_path, b.hierarchy_path);
            assert_eq!(a.dependencies, b.dependencies);
        }
        // full f64 precision survives
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_json_shape() {
        let value: serde_json::Value = serde_json::from_str(&to_json(&sample(), false).unwrap()).unwrap();
        assert_eq!(value["documentType"], "part");
        assert!(value["metadata"]["runId"].is_string());
        assert!(value["metadata"]["extractedAt"].is_string());
        let boss = &value["featureTree"][1];
        assert_eq!(boss["category"], "extrude");
        assert_eq!(boss["creationOrder"], 1);
        assert_eq!(boss["hierarchyPath"], "2");
        assert_eq!(boss["children"][0]["hierarchyPath"], "2.1");
        assert_eq!(boss["attributes"]["depth"]["unit"], "m");
        assert!(boss.get("error").is_none());
        assert!(value["featureTree"][2]["error"].is_object());
        assert_eq!(value["featureRelationships"]["Sketch1"][0], "Top Plane");
    }

    #[test]
    fn test_deep_tree_reads_back() {
        let mut feature = MemoryFeature::new("Nested80", "ProfileFeature").with_sketch(
            ft_session::MemorySketch::default()
                .with("PlaneName", PropertyValue::Text("Front Plane".into()))
                .with(
                    "ModelToSketchTransform",
                    PropertyValue::Floats(vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]),
                ),
        );
        for i in (1..80).rev() {
            feature = MemoryFeature::new(format!("Nested{i}"), "ProfileFeature").with_sub_feature(feature);
        }
        let doc = MemoryDocument::new("Deep", DocumentKind::Part).with_feature(feature);
        let original = extract_document(&MemorySession::new(doc), &ExtractConfig::default()).unwrap();
        assert_eq!(
            walk_forest(&original.feature_tree).count(),
            crate::constants::MAX_NESTING_DEPTH + 1
        );

        for pretty in [true, false] {
            let parsed = from_json(&to_json(&original, pretty).unwrap()).unwrap();
            assert_eq!(parsed, original);
        }
    }

    #[test]
    fn test_overflowing_angle_reads_back() {
        let doc = MemoryDocument::new("Draft", DocumentKind::Part)
            .with_feature(MemoryFeature::new("Draft1", "Draft").with("Angle", PropertyValue::Float(1e308)));
        let original = extract_document(&MemorySession::new(doc), &ExtractConfig::default()).unwrap();
        let angle = &original.feature_tree[0].attributes["angle"];
        assert_eq!(angle.as_f64(), Some(1e308));
        assert!(angle.degrees.is_none());

        let parsed = from_json(&to_json(&original, true).unwrap()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join(default_output_file_name("Plate.SLDPRT"));
        let doc = sample();
        save(&doc, &path, true).unwrap();
        let loaded = load(&path).unwrap();
        assert!(loaded.same_structure(&doc));
        assert_eq!(loaded.feature_tree[0].category, FeatureCategory::ReferencePlane);
    }

    #[test]
    fn test_default_output_file_name() {
        assert_eq!(
            default_output_file_name("Bracket.SLDPRT"),
            "Bracket_SLDPRT_feature_tree.json"
        );
        assert_eq!(default_output_file_name(""), "document_feature_tree.json");
        assert!(default_output_path("/tmp", "A.B").ends_with("A_B_feature_tree.json"));
    }

    #[test]
    fn test_load_invalid() {
        assert!(matches!(from_json("{"), Err(ExportError::Deserialize(_))));
        assert!(matches!(load("/nonexistent/tree.json"), Err(ExportError::Io(_))));
    }
}
